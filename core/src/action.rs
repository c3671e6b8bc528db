// Crowd control action data model
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CrowdpadError, Result};

/// Controller buttons a chatter can press
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrowdControlButton {
    A,
    B,
    X,
    Y,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
    Select,
    Start,
    TriggerLeft,
    TriggerRight,
    // Extended controllers only
    C,
    Z,
}

impl fmt::Display for CrowdControlButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CrowdControlButton::A => "A",
            CrowdControlButton::B => "B",
            CrowdControlButton::X => "X",
            CrowdControlButton::Y => "Y",
            CrowdControlButton::DpadUp => "dpad up",
            CrowdControlButton::DpadDown => "dpad down",
            CrowdControlButton::DpadLeft => "dpad left",
            CrowdControlButton::DpadRight => "dpad right",
            CrowdControlButton::Select => "select",
            CrowdControlButton::Start => "start",
            CrowdControlButton::TriggerLeft => "left trigger",
            CrowdControlButton::TriggerRight => "right trigger",
            CrowdControlButton::C => "C",
            CrowdControlButton::Z => "Z",
        };
        f.write_str(s)
    }
}

/// The two kinds of crowd control intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrowdControlActionKind {
    ButtonPress {
        button: CrowdControlButton,
    },
    GameShuffle {
        /// Whether this shuffle rides an already-running giga shuffle streak
        entry_within_giga_shuffle: bool,
        /// Set only when this action begins a multi-shuffle streak
        start_of_giga_shuffle_size: Option<u32>,
    },
}

/// One crowd control intent submitted for execution.
///
/// Identity and channel fields are immutable and validated non-empty at
/// construction. `handle_attempts` is the only mutable state; it is
/// incremented exactly once per dispatch attempt by the machine's action loop.
#[derive(Debug)]
pub struct CrowdControlAction {
    kind: CrowdControlActionKind,
    action_id: String,
    chatter_user_id: String,
    chatter_user_name: String,
    twitch_channel: String,
    twitch_channel_id: String,
    twitch_chat_message_id: Option<String>,
    date_time: DateTime<Utc>,
    handle_attempts: AtomicU32,
}

impl CrowdControlAction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kind: CrowdControlActionKind,
        action_id: String,
        chatter_user_id: String,
        chatter_user_name: String,
        twitch_channel: String,
        twitch_channel_id: String,
        twitch_chat_message_id: Option<String>,
        date_time: DateTime<Utc>,
    ) -> Result<Self> {
        for (name, value) in [
            ("action_id", &action_id),
            ("chatter_user_id", &chatter_user_id),
            ("chatter_user_name", &chatter_user_name),
            ("twitch_channel", &twitch_channel),
            ("twitch_channel_id", &twitch_channel_id),
        ] {
            if value.is_empty() {
                return Err(CrowdpadError::ActionError(format!(
                    "{} must not be empty",
                    name
                )));
            }
        }

        // Normalize an empty chat message id to absent
        let twitch_chat_message_id = twitch_chat_message_id.filter(|id| !id.is_empty());

        Ok(Self {
            kind,
            action_id,
            chatter_user_id,
            chatter_user_name,
            twitch_channel,
            twitch_channel_id,
            twitch_chat_message_id,
            date_time,
            handle_attempts: AtomicU32::new(0),
        })
    }

    pub fn kind(&self) -> &CrowdControlActionKind {
        &self.kind
    }

    pub fn action_id(&self) -> &str {
        &self.action_id
    }

    pub fn chatter_user_id(&self) -> &str {
        &self.chatter_user_id
    }

    pub fn chatter_user_name(&self) -> &str {
        &self.chatter_user_name
    }

    pub fn twitch_channel(&self) -> &str {
        &self.twitch_channel
    }

    pub fn twitch_channel_id(&self) -> &str {
        &self.twitch_channel_id
    }

    pub fn twitch_chat_message_id(&self) -> Option<&str> {
        self.twitch_chat_message_id.as_deref()
    }

    /// Creation timestamp; the TTL policy measures age from here
    pub fn date_time(&self) -> DateTime<Utc> {
        self.date_time
    }

    pub fn handle_attempts(&self) -> u32 {
        self.handle_attempts.load(Ordering::SeqCst)
    }

    /// Returns the attempt count after incrementing
    pub(crate) fn increment_handle_attempts(&self) -> u32 {
        self.handle_attempts.fetch_add(1, Ordering::SeqCst) + 1
    }
}
