use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crowdpad_core::{AutomatorConfig, MachineConfig, StaticCrowdControlSettings};

/// High-level configuration for the chatbot demo
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChatbotConfig {
    pub machine: MachineConfig,
    pub settings: StaticCrowdControlSettings,
    pub automator: AutomatorConfig,
    pub channel: ChannelConfig,
    pub bot: BotConfig,
}

/// The channel the demo drives
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub twitch_channel: String,
    pub twitch_channel_id: String,
    pub shuffle_reoccur_seconds: u64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            twitch_channel: std::env::var("CROWDPAD_CHANNEL")
                .unwrap_or_else(|_| "somestreamer".to_string()),
            twitch_channel_id: std::env::var("CROWDPAD_CHANNEL_ID")
                .unwrap_or_else(|_| "channel1".to_string()),
            shuffle_reoccur_seconds: std::env::var("CROWDPAD_SHUFFLE_REOCCUR_SECONDS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(600),
        }
    }
}

/// Identity automated shuffles are attributed to
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub user_id: String,
    pub user_name: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            user_id: std::env::var("CROWDPAD_BOT_USER_ID")
                .unwrap_or_else(|_| "bot1".to_string()),
            user_name: std::env::var("CROWDPAD_BOT_USER_NAME")
                .unwrap_or_else(|_| "crowdpadbot".to_string()),
        }
    }
}

impl ChatbotConfig {
    /// Load configuration from a TOML file (path via CHATBOT_CONFIG or
    /// ./chatbot.toml), overlaying values onto env-driven defaults.
    pub fn load() -> Self {
        let path = std::env::var("CHATBOT_CONFIG").unwrap_or_else(|_| "chatbot.toml".to_string());
        if !Path::new(&path).exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(raw) => match toml::from_str::<ChatbotConfig>(&raw) {
                Ok(cfg) => {
                    info!(target: "chatbot", path = %path, "Loaded configuration");
                    cfg
                }
                Err(error) => {
                    warn!(target: "chatbot", path = %path, error = %error, "Bad config file, using defaults");
                    Self::default()
                }
            },
            Err(error) => {
                warn!(target: "chatbot", path = %path, error = %error, "Could not read config file, using defaults");
                Self::default()
            }
        }
    }
}
