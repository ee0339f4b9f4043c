use std::sync::Arc;

use tracing::{debug, info, warn};

use fw_core::{
    domain::{ChatId, FlightObservation},
    fetcher::FetchError,
    formatting::{chunk_lines, escape_html, flights_reply, status_reply, StatusView, FETCH_ERROR_REPLY},
    messaging::types::ChatAction,
};

use crate::router::AppState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BotCommand {
    Flights,
    Status,
    Help,
}

const HELP_TEXT: &str = "Flight watch bot\n\
/flights (or !flights) - list current flights touching the watched airports\n\
/status - last check, tracked flights and cache state\n\
/help - this message";

/// Accepts `/cmd`, `/cmd@botname` and `!cmd`; anything else is not a command.
pub fn parse_command(text: &str) -> Option<BotCommand> {
    let first = text.split_whitespace().next()?;
    let name = first
        .strip_prefix('/')
        .or_else(|| first.strip_prefix('!'))?
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    match name.as_str() {
        "flights" => Some(BotCommand::Flights),
        "status" => Some(BotCommand::Status),
        "help" | "start" => Some(BotCommand::Help),
        _ => None,
    }
}

pub async fn handle_command(chat_id: ChatId, command: BotCommand, state: Arc<AppState>) {
    info!(chat = chat_id.0, ?command, "command received");

    let reply = match command {
        BotCommand::Flights => {
            if state.messenger.capabilities().supports_chat_actions {
                let _ = state
                    .messenger
                    .send_chat_action(chat_id, ChatAction::Typing)
                    .await;
            }
            flights_reply_text(state.monitor.current_flights().await)
        }
        BotCommand::Status => {
            let status = state.monitor.status().await;
            status_reply(&StatusView {
                watch: state.monitor.watch().iter().collect(),
                tracked: status.tracked,
                cycles: status.cycles,
                last_checked: status.last_checked,
                cache_age_secs: status.cache_age.map(|d| d.as_secs()),
                poll_interval_secs: state.cfg.poll_interval.as_secs(),
            })
        }
        BotCommand::Help => HELP_TEXT.to_string(),
    };

    send_split(&state, chat_id, &reply).await;
}

fn flights_reply_text(result: Result<Vec<FlightObservation>, FetchError>) -> String {
    match result {
        Ok(flights) => flights_reply(&flights),
        Err(e) => {
            warn!(error = %e, "flights command could not fetch data");
            FETCH_ERROR_REPLY.to_string()
        }
    }
}

async fn send_split(state: &AppState, chat_id: ChatId, text: &str) {
    let limit = state
        .cfg
        .telegram_safe_limit
        .min(state.messenger.capabilities().max_message_len);
    for chunk in chunk_lines(&escape_html(text), limit) {
        match state.messenger.send_html(chat_id, &chunk).await {
            Ok(sent) => debug!(chat = chat_id.0, message_id = sent.message_id.0, "reply chunk sent"),
            Err(e) => {
                warn!(chat = chat_id.0, error = %e, "reply not delivered");
                return;
            }
        }
    }
}
