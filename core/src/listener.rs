// Message listener contract
use async_trait::async_trait;

use crate::message::CrowdControlMessage;

/// Receives messages drained from the machine's message queue.
///
/// Delivery is at-most-once and best-effort; the machine does not consult a
/// return value and never retries delivery.
#[async_trait]
pub trait MessageListener: Send + Sync {
    async fn on_new_message(&self, message: CrowdControlMessage);
}
