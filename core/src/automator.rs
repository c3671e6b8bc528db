// Periodic game shuffle automation
//
// For each registered channel, submits a GameShuffle action attributed to the
// bot itself once `reoccur_seconds` has elapsed since the last automated
// shuffle (or immediately for a channel that has never fired).
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

use crate::action::{CrowdControlAction, CrowdControlActionKind};
use crate::ids::IdGenerator;
use crate::machine::CrowdControlMachine;
use crate::{CrowdpadError, Result};

/// The bot account automated shuffles are attributed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub user_id: String,
    pub user_name: String,
}

/// Resolves the bot's own Twitch identity
#[async_trait]
pub trait BotIdentityProvider: Send + Sync {
    async fn bot_identity(&self) -> Result<BotIdentity>;
}

/// Per-channel user settings lookup
#[async_trait]
pub trait UserSettingsLookup: Send + Sync {
    async fn is_crowd_control_enabled(&self, twitch_channel_id: &str) -> Result<bool>;
}

/// One automator registration; at most one per channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameShuffleAutomatorEntry {
    twitch_channel: String,
    twitch_channel_id: String,
    reoccur_seconds: u64,
}

impl GameShuffleAutomatorEntry {
    pub fn new(
        twitch_channel: String,
        twitch_channel_id: String,
        reoccur_seconds: u64,
    ) -> Result<Self> {
        if twitch_channel.is_empty() {
            return Err(CrowdpadError::AutomatorError(
                "twitch_channel must not be empty".to_string(),
            ));
        }
        if twitch_channel_id.is_empty() {
            return Err(CrowdpadError::AutomatorError(
                "twitch_channel_id must not be empty".to_string(),
            ));
        }
        if reoccur_seconds < 1 {
            return Err(CrowdpadError::AutomatorError(format!(
                "reoccur_seconds must be at least 1, got {}",
                reoccur_seconds
            )));
        }

        Ok(Self {
            twitch_channel,
            twitch_channel_id,
            reoccur_seconds,
        })
    }

    pub fn twitch_channel(&self) -> &str {
        &self.twitch_channel
    }

    pub fn twitch_channel_id(&self) -> &str {
        &self.twitch_channel_id
    }

    pub fn reoccur_seconds(&self) -> u64 {
        self.reoccur_seconds
    }
}

/// Automator loop cadence
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomatorConfig {
    pub wake_interval_seconds: f64,
}

impl Default for AutomatorConfig {
    fn default() -> Self {
        Self {
            wake_interval_seconds: std::env::var("CROWDPAD_AUTOMATOR_WAKE_SECONDS")
                .ok()
                .and_then(|v| v.parse::<f64>().ok())
                .unwrap_or(30.0),
        }
    }
}

/// Background component that re-submits game shuffles on per-channel timers.
///
/// Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct GameShuffleAutomator {
    machine: CrowdControlMachine,
    identity: Arc<dyn BotIdentityProvider>,
    user_settings: Arc<dyn UserSettingsLookup>,
    ids: IdGenerator,
    entries: Arc<DashMap<String, GameShuffleAutomatorEntry>>,
    last_shuffle_times: Arc<DashMap<String, DateTime<Utc>>>,
    started: Arc<AtomicBool>,
    wake_interval: Duration,
}

impl GameShuffleAutomator {
    pub fn new(
        config: AutomatorConfig,
        machine: CrowdControlMachine,
        identity: Arc<dyn BotIdentityProvider>,
        user_settings: Arc<dyn UserSettingsLookup>,
    ) -> Self {
        Self {
            machine,
            identity,
            user_settings,
            ids: IdGenerator::new(),
            entries: Arc::new(DashMap::new()),
            last_shuffle_times: Arc::new(DashMap::new()),
            started: Arc::new(AtomicBool::new(false)),
            wake_interval: Duration::from_secs_f64(config.wake_interval_seconds.max(0.001)),
        }
    }

    /// Upsert a registration. Returns `true` when an existing registration for
    /// the same channel was replaced.
    pub fn add_game_shuffle_automator(&self, entry: GameShuffleAutomatorEntry) -> bool {
        let channel_id = entry.twitch_channel_id().to_string();
        let twitch_channel = entry.twitch_channel().to_string();
        let reoccur_seconds = entry.reoccur_seconds();
        let replaced = self.entries.insert(channel_id, entry).is_some();
        info!(
            target: "automator",
            twitch_channel = %twitch_channel,
            reoccur_seconds,
            replaced,
            "Registered game shuffle automator"
        );
        replaced
    }

    /// Remove a registration and its last-shuffle bookkeeping. Returns whether
    /// an entry existed to remove.
    pub fn remove_game_shuffle_automator(&self, twitch_channel_id: &str) -> bool {
        let removed = self.entries.remove(twitch_channel_id).is_some();
        self.last_shuffle_times.remove(twitch_channel_id);
        if removed {
            info!(
                target: "automator",
                twitch_channel_id,
                "Removed game shuffle automator"
            );
        }
        removed
    }

    /// Launch the automator loop. Idempotent: later calls log and return `false`.
    pub fn start(&self) -> bool {
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!(target: "automator", "Automator already started");
            return false;
        }

        info!(target: "automator", "Starting game shuffle automator");

        let automator = self.clone();
        tokio::spawn(async move {
            loop {
                automator.handle_cycle().await;
                sleep(automator.wake_interval).await;
            }
        });

        true
    }

    async fn handle_cycle(&self) {
        let now = Utc::now();
        let due: Vec<GameShuffleAutomatorEntry> = self
            .entries
            .iter()
            .filter(|entry| match self.last_shuffle_times.get(entry.key()) {
                Some(last) => {
                    (now - *last.value()).num_seconds() >= entry.value().reoccur_seconds() as i64
                }
                None => true,
            })
            .map(|entry| entry.value().clone())
            .collect();

        for entry in due {
            self.fire(entry).await;
        }
    }

    async fn fire(&self, entry: GameShuffleAutomatorEntry) {
        let identity = match self.identity.bot_identity().await {
            Ok(identity) => identity,
            Err(error) => {
                warn!(
                    target: "automator",
                    twitch_channel = %entry.twitch_channel(),
                    error = %error,
                    "Could not resolve bot identity, skipping automated shuffle"
                );
                return;
            }
        };

        match self
            .user_settings
            .is_crowd_control_enabled(entry.twitch_channel_id())
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                info!(
                    target: "automator",
                    twitch_channel = %entry.twitch_channel(),
                    "Crowd control disabled for channel, removing automator"
                );
                self.remove_game_shuffle_automator(entry.twitch_channel_id());
                return;
            }
            Err(error) => {
                // Possibly transient; the registration stays
                warn!(
                    target: "automator",
                    twitch_channel = %entry.twitch_channel(),
                    error = %error,
                    "User settings lookup failed, skipping automated shuffle"
                );
                return;
            }
        }

        let action = match CrowdControlAction::new(
            CrowdControlActionKind::GameShuffle {
                entry_within_giga_shuffle: false,
                start_of_giga_shuffle_size: None,
            },
            self.ids.generate_action_id(),
            identity.user_id,
            identity.user_name,
            entry.twitch_channel().to_string(),
            entry.twitch_channel_id().to_string(),
            None,
            Utc::now(),
        ) {
            Ok(action) => action,
            Err(error) => {
                warn!(
                    target: "automator",
                    twitch_channel = %entry.twitch_channel(),
                    error = %error,
                    "Could not build automated shuffle action"
                );
                return;
            }
        };

        info!(
            target: "automator",
            twitch_channel = %entry.twitch_channel(),
            "Submitting automated game shuffle"
        );
        self.machine.submit_action(action).await;
        self.last_shuffle_times
            .insert(entry.twitch_channel_id().to_string(), Utc::now());
    }
}
