// Identifier generation for actions and messages
use uuid::Uuid;

/// Produces collision-resistant identifiers: UUID v4 rendered without hyphens,
/// which leaves lowercase alphanumeric text only.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdGenerator;

impl IdGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate_action_id(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }

    pub fn generate_message_id(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}
