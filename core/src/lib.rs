// Crowdpad Core Library
// Crowd control action dispatch runtime for a Twitch chatbot

pub mod action;
pub mod automator;
pub mod handler;
pub mod ids;
pub mod listener;
pub mod machine;
pub mod message;
pub mod message_handler;
pub mod presenter;
pub mod settings;
pub mod sound;
pub mod telemetry;

// Export core types
pub use action::{CrowdControlAction, CrowdControlActionKind, CrowdControlButton};
pub use automator::{
    AutomatorConfig, BotIdentity, BotIdentityProvider, GameShuffleAutomator,
    GameShuffleAutomatorEntry, UserSettingsLookup,
};
pub use handler::{ActionHandler, ActionHandlerError, HandleOutcome};
pub use ids::IdGenerator;
pub use listener::MessageListener;
pub use machine::{CrowdControlMachine, CrowdControlMachineStats, MachineConfig};
pub use message::CrowdControlMessage;
pub use message_handler::{ChatSender, CrowdControlMessageHandler};
pub use presenter::{EmoteLookup, GigaShufflePresenter};
pub use settings::{CrowdControlSettings, StaticCrowdControlSettings};
pub use sound::{SoundAlert, SoundPlayer};

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrowdpadError {
    #[error("Action error: {0}")]
    ActionError(String),

    #[error("Machine error: {0}")]
    MachineError(String),

    #[error("Automator error: {0}")]
    AutomatorError(String),

    #[error("Chat error: {0}")]
    ChatError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
pub type Result<T> = std::result::Result<T, CrowdpadError>;
