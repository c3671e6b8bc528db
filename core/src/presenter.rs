// Giga shuffle announcement formatting
use std::sync::Arc;

use async_trait::async_trait;

use crate::action::CrowdControlActionKind;
use crate::message::CrowdControlMessage;

/// Emote used when the channel lookup yields nothing
pub const DEFAULT_CELEBRATORY_EMOTE: &str = "🎉";

/// Resolves a decorative emote for a channel
#[async_trait]
pub trait EmoteLookup: Send + Sync {
    async fn celebratory_emote(&self, twitch_channel_id: &str) -> Option<String>;
}

/// Formats giga shuffle start announcements.
///
/// Yields text only for messages whose originating action is a GameShuffle
/// beginning a giga shuffle of size 2 or more; everything else is `None`.
pub struct GigaShufflePresenter {
    emotes: Arc<dyn EmoteLookup>,
}

impl GigaShufflePresenter {
    pub fn new(emotes: Arc<dyn EmoteLookup>) -> Self {
        Self { emotes }
    }

    pub async fn present(&self, message: &CrowdControlMessage) -> Option<String> {
        let giga_size = match message.action().kind() {
            CrowdControlActionKind::GameShuffle {
                start_of_giga_shuffle_size: Some(size),
                ..
            } => *size,
            _ => return None,
        };
        if giga_size < 2 {
            return None;
        }

        let emote = self
            .emotes
            .celebratory_emote(message.twitch_channel_id())
            .await
            .unwrap_or_else(|| DEFAULT_CELEBRATORY_EMOTE.to_string());

        Some(format!(
            "{} A GIGA SHUFFLE of {} games has begun! {}",
            emote,
            group_digits(u64::from(giga_size)),
            emote
        ))
    }
}

/// Render an integer with thousands grouping ("1234567" -> "1,234,567")
fn group_digits(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
