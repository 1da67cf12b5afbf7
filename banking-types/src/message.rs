//! Conversation transcript entries.

use serde::{Deserialize, Serialize};

/// Who produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The customer.
    User,
    /// The dialogue engine's reply.
    Assistant,
    /// An internal system-log entry (not shown to the customer).
    System,
}

/// One entry in `ConversationState::messages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Who produced this entry.
    pub role: Role,
    /// The text content.
    pub content: String,
}

impl Message {
    /// Construct a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Construct an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Construct a system-log message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}
