// Dynamic policy knobs for the crowd control machine
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Policy provider polled by the machine on every loop cycle, so values may
/// change while the machine runs.
#[async_trait]
pub trait CrowdControlSettings: Send + Sync {
    /// Global crowd control toggle; disabled actions are re-queued
    async fn is_enabled(&self) -> bool;

    async fn are_sounds_enabled(&self) -> bool;

    /// Attempt ceiling before an action is abandoned
    async fn max_handle_attempts(&self) -> u32;

    /// Maximum action age in seconds before it is abandoned outright
    async fn seconds_to_live(&self) -> u32;

    async fn action_loop_cooldown_seconds(&self) -> f64;

    async fn message_cooldown_seconds(&self) -> f64;

    async fn media_player_volume(&self) -> u8;
}

/// Fixed-value settings used by the demo app and tests
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticCrowdControlSettings {
    pub enabled: bool,
    pub sounds_enabled: bool,
    pub max_handle_attempts: u32,
    pub seconds_to_live: u32,
    pub action_loop_cooldown_seconds: f64,
    pub message_cooldown_seconds: f64,
    pub media_player_volume: u8,
}

impl Default for StaticCrowdControlSettings {
    fn default() -> Self {
        Self {
            enabled: env_or("CROWDPAD_ENABLED", true),
            sounds_enabled: env_or("CROWDPAD_SOUNDS_ENABLED", true),
            max_handle_attempts: env_or("CROWDPAD_MAX_HANDLE_ATTEMPTS", 3),
            seconds_to_live: env_or("CROWDPAD_SECONDS_TO_LIVE", 300),
            action_loop_cooldown_seconds: env_or("CROWDPAD_ACTION_COOLDOWN_SECONDS", 0.5),
            message_cooldown_seconds: env_or("CROWDPAD_MESSAGE_COOLDOWN_SECONDS", 1.0),
            media_player_volume: env_or("CROWDPAD_MEDIA_PLAYER_VOLUME", 50),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[async_trait]
impl CrowdControlSettings for StaticCrowdControlSettings {
    async fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn are_sounds_enabled(&self) -> bool {
        self.sounds_enabled
    }

    async fn max_handle_attempts(&self) -> u32 {
        self.max_handle_attempts
    }

    async fn seconds_to_live(&self) -> u32 {
        self.seconds_to_live
    }

    async fn action_loop_cooldown_seconds(&self) -> f64 {
        self.action_loop_cooldown_seconds
    }

    async fn message_cooldown_seconds(&self) -> f64 {
        self.message_cooldown_seconds
    }

    async fn media_player_volume(&self) -> u8 {
        self.media_player_volume
    }
}
