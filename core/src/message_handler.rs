// Message listener glue: presenter + chat delivery
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::listener::MessageListener;
use crate::message::CrowdControlMessage;
use crate::presenter::GigaShufflePresenter;
use crate::Result;

/// Sends a line of text to a Twitch channel
#[async_trait]
pub trait ChatSender: Send + Sync {
    async fn send_message(
        &self,
        twitch_channel: &str,
        text: &str,
        reply_to_message_id: Option<&str>,
    ) -> Result<()>;
}

/// Default `MessageListener`: runs the presenter and, when it yields text,
/// sends the announcement to the originating channel, replying to the
/// triggering chat message when one exists. Send failures are logged only.
pub struct CrowdControlMessageHandler {
    presenter: GigaShufflePresenter,
    chat: Arc<dyn ChatSender>,
}

impl CrowdControlMessageHandler {
    pub fn new(presenter: GigaShufflePresenter, chat: Arc<dyn ChatSender>) -> Self {
        Self { presenter, chat }
    }
}

#[async_trait]
impl MessageListener for CrowdControlMessageHandler {
    async fn on_new_message(&self, message: CrowdControlMessage) {
        let text = match self.presenter.present(&message).await {
            Some(text) => text,
            None => {
                debug!(
                    target: "crowd_control",
                    message_id = %message.message_id(),
                    "Message produced no announcement"
                );
                return;
            }
        };

        if let Err(error) = self
            .chat
            .send_message(
                message.twitch_channel(),
                &text,
                message.twitch_chat_message_id(),
            )
            .await
        {
            warn!(
                target: "crowd_control",
                message_id = %message.message_id(),
                twitch_channel = %message.twitch_channel(),
                error = %error,
                "Failed to send giga shuffle announcement"
            );
        }
    }
}
