//! Telegram update handlers.
//!
//! Only text commands are handled; every other update is ignored.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use crate::router::AppState;

mod commands;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let Some(command) = commands::parse_command(text) else {
        return Ok(());
    };

    commands::handle_command(fw_core::domain::ChatId(msg.chat.id.0), command, state).await;
    Ok(())
}
