use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::{
    domain::{ChatId, FlightEvent},
    formatting::{escape_html, event_line},
    messaging::port::MessagingPort,
    ports::Notifier,
    Result,
};

/// Posts one line per event into a fixed channel.
pub struct ChannelNotifier {
    messenger: Arc<dyn MessagingPort>,
    chat_id: ChatId,
}

impl ChannelNotifier {
    pub fn new(messenger: Arc<dyn MessagingPort>, chat_id: ChatId) -> Self {
        Self { messenger, chat_id }
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn notify(&self, event: &FlightEvent) -> Result<()> {
        let line = event_line(event);
        info!(
            callsign = %event.observation.id,
            kind = event.kind.as_str(),
            "sending {line}"
        );
        let sent = self
            .messenger
            .send_html(self.chat_id, &escape_html(&line))
            .await?;
        debug!(message_id = sent.message_id.0, "event posted");
        Ok(())
    }
}
