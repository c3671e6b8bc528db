// Action handler contract
//
// The handler performs the actual input injection against a game or emulator
// process. The machine maps its explicit outcomes and its error kinds onto the
// retry/abandon policy.
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::action::CrowdControlAction;

/// Explicit result of a handler dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    /// The input was injected; the action may emit a chat message
    Ok,
    /// The input was not injected but the action should be re-queued
    Retry,
    /// The input was not injected and the action should be dropped
    Abandon,
}

/// Failure kinds a handler may surface.
///
/// `ProcessNotFound`, `CannotConnect` and `PermissionDenied` are terminal for
/// the action; anything else is treated as transient.
#[derive(Error, Debug)]
pub enum ActionHandlerError {
    #[error("Game process not found: {0}")]
    ProcessNotFound(String),

    #[error("Cannot connect to game process: {0}")]
    CannotConnect(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("{0}")]
    Other(String),
}

/// Trait implemented by concrete input-injection backends
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn handle_button_press(
        &self,
        action: Arc<CrowdControlAction>,
    ) -> std::result::Result<HandleOutcome, ActionHandlerError>;

    async fn handle_game_shuffle(
        &self,
        action: Arc<CrowdControlAction>,
    ) -> std::result::Result<HandleOutcome, ActionHandlerError>;
}
