// Chat-facing notification derived from action outcomes
use std::sync::Arc;

use crate::action::CrowdControlAction;

/// Wraps the originating action together with its own unique id. Channel and
/// chat-message identity are read through the action; the message never
/// touches the action's mutable state.
#[derive(Debug, Clone)]
pub struct CrowdControlMessage {
    message_id: String,
    action: Arc<CrowdControlAction>,
}

impl CrowdControlMessage {
    pub fn new(message_id: String, action: Arc<CrowdControlAction>) -> Self {
        Self { message_id, action }
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub fn action(&self) -> &Arc<CrowdControlAction> {
        &self.action
    }

    pub fn twitch_channel(&self) -> &str {
        self.action.twitch_channel()
    }

    pub fn twitch_channel_id(&self) -> &str {
        self.action.twitch_channel_id()
    }

    pub fn twitch_chat_message_id(&self) -> Option<&str> {
        self.action.twitch_chat_message_id()
    }
}
