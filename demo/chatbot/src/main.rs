mod config;

use std::sync::Arc;

use chrono::Utc;
use tokio::signal;
use tracing::info;

use config::ChatbotConfig;
use crowdpad_core::{
    ActionHandler, ActionHandlerError, AutomatorConfig, BotIdentity, BotIdentityProvider,
    ChatSender, CrowdControlAction, CrowdControlActionKind, CrowdControlButton,
    CrowdControlMachine, CrowdControlMessageHandler, EmoteLookup, GameShuffleAutomator,
    GameShuffleAutomatorEntry, GigaShufflePresenter, HandleOutcome, IdGenerator, Result,
    SoundAlert, SoundPlayer, UserSettingsLookup,
};

// Handler that logs instead of injecting input
struct LoggingActionHandler;

#[async_trait::async_trait]
impl ActionHandler for LoggingActionHandler {
    async fn handle_button_press(
        &self,
        action: Arc<CrowdControlAction>,
    ) -> std::result::Result<HandleOutcome, ActionHandlerError> {
        if let CrowdControlActionKind::ButtonPress { button } = action.kind() {
            info!(target: "chatbot", button = %button, chatter = %action.chatter_user_name(), "🎮 Button press");
        }
        Ok(HandleOutcome::Ok)
    }

    async fn handle_game_shuffle(
        &self,
        action: Arc<CrowdControlAction>,
    ) -> std::result::Result<HandleOutcome, ActionHandlerError> {
        info!(target: "chatbot", chatter = %action.chatter_user_name(), "🔀 Game shuffle");
        Ok(HandleOutcome::Ok)
    }
}

struct LoggingSoundPlayer;

#[async_trait::async_trait]
impl SoundPlayer for LoggingSoundPlayer {
    async fn play(&self, alert: SoundAlert, volume: u8) {
        info!(target: "chatbot", ?alert, volume, "🔊 Sound alert");
    }
}

struct ConsoleChatSender;

#[async_trait::async_trait]
impl ChatSender for ConsoleChatSender {
    async fn send_message(
        &self,
        twitch_channel: &str,
        text: &str,
        _reply_to_message_id: Option<&str>,
    ) -> Result<()> {
        info!(target: "chatbot", twitch_channel, "💬 {}", text);
        Ok(())
    }
}

struct NoEmotes;

#[async_trait::async_trait]
impl EmoteLookup for NoEmotes {
    async fn celebratory_emote(&self, _twitch_channel_id: &str) -> Option<String> {
        None
    }
}

struct ConfigIdentity {
    identity: BotIdentity,
}

#[async_trait::async_trait]
impl BotIdentityProvider for ConfigIdentity {
    async fn bot_identity(&self) -> Result<BotIdentity> {
        Ok(self.identity.clone())
    }
}

struct AlwaysEnabled;

#[async_trait::async_trait]
impl UserSettingsLookup for AlwaysEnabled {
    async fn is_crowd_control_enabled(&self, _twitch_channel_id: &str) -> Result<bool> {
        Ok(true)
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    crowdpad_core::telemetry::init_tracing("info,crowdpad_core=info,chatbot=info");

    info!(target: "chatbot", "Starting crowd control demo");

    // Load configuration (defaults + env + optional TOML overlay)
    let cfg = ChatbotConfig::load();

    let machine = CrowdControlMachine::new(
        cfg.machine.clone(),
        Arc::new(cfg.settings.clone()),
        Some(Arc::new(LoggingSoundPlayer)),
    );
    machine
        .set_action_handler(Some(Arc::new(LoggingActionHandler)))
        .await;

    let presenter = GigaShufflePresenter::new(Arc::new(NoEmotes));
    let listener = CrowdControlMessageHandler::new(presenter, Arc::new(ConsoleChatSender));
    machine.set_message_listener(Some(Arc::new(listener))).await;

    machine.start();

    // Periodic shuffles attributed to the bot itself
    let automator = GameShuffleAutomator::new(
        AutomatorConfig {
            wake_interval_seconds: cfg.automator.wake_interval_seconds,
        },
        machine.clone(),
        Arc::new(ConfigIdentity {
            identity: BotIdentity {
                user_id: cfg.bot.user_id.clone(),
                user_name: cfg.bot.user_name.clone(),
            },
        }),
        Arc::new(AlwaysEnabled),
    );
    automator.add_game_shuffle_automator(GameShuffleAutomatorEntry::new(
        cfg.channel.twitch_channel.clone(),
        cfg.channel.twitch_channel_id.clone(),
        cfg.channel.shuffle_reoccur_seconds,
    )?);
    automator.start();

    // A couple of sample submissions, as a chat command handler would make
    let ids = IdGenerator::new();
    machine
        .submit_action(CrowdControlAction::new(
            CrowdControlActionKind::ButtonPress {
                button: CrowdControlButton::A,
            },
            ids.generate_action_id(),
            "chatter1".to_string(),
            "somechatter".to_string(),
            cfg.channel.twitch_channel.clone(),
            cfg.channel.twitch_channel_id.clone(),
            None,
            Utc::now(),
        )?)
        .await;
    machine
        .submit_action(CrowdControlAction::new(
            CrowdControlActionKind::GameShuffle {
                entry_within_giga_shuffle: false,
                start_of_giga_shuffle_size: Some(3),
            },
            ids.generate_action_id(),
            "chatter1".to_string(),
            "somechatter".to_string(),
            cfg.channel.twitch_channel,
            cfg.channel.twitch_channel_id,
            None,
            Utc::now(),
        )?)
        .await;

    // The loops have no stop API; Ctrl+C ends the process
    signal::ctrl_c().await?;
    info!(target: "chatbot", "Shutting down");
    Ok(())
}
