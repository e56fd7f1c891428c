use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Which side of the conversation produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// A single entry in the conversation thread.
///
/// User messages are immutable once created. Assistant messages start out
/// as empty placeholders and are rewritten by the conversation while the
/// associated model invocation is in flight; after finalization they are
/// not touched again.
#[derive(Debug, Clone)]
pub struct Message {
    /// Opaque unique identifier, used to locate the streaming placeholder.
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Model-suggested next questions, at most four, present only on
    /// finalized assistant messages.
    pub follow_up_questions: Option<Vec<String>>,
}

impl Message {
    /// Creates a user message with the given content.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            follow_up_questions: None,
        }
    }

    /// Creates the empty assistant placeholder appended right after a user
    /// message, before any model output has arrived.
    pub fn assistant_placeholder() -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            content: String::new(),
            timestamp: Utc::now(),
            follow_up_questions: None,
        }
    }

    /// Creates the assistant message that replaces a placeholder when the
    /// invocation fails. The id is reused so the thread never holds two
    /// entries for one turn.
    pub fn assistant_error(id: Uuid, description: &str) -> Self {
        Self {
            id,
            role: Role::Assistant,
            content: format!("Error: {description}"),
            timestamp: Utc::now(),
            follow_up_questions: None,
        }
    }

    /// True for assistant messages produced by the error path.
    pub fn is_error(&self) -> bool {
        self.role == Role::Assistant && self.content.starts_with("Error: ")
    }
}
