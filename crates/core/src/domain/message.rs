// Message Domain Model

use super::queue::QueueName;
use serde::{Deserialize, Serialize};

/// Message ID (strictly increasing, assigned by the store)
pub type MessageId = i64;

/// A stored queue message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    /// Queue the message was appended to (owner's queue at insert time)
    pub queue: QueueName,
    /// Username of the principal that appended it
    pub author: String,
    pub content: String,
    pub created_at: i64, // epoch ms
}

impl Message {
    /// Recency order used by listing and truncation: created_at, then id
    pub fn is_newer_than(&self, other: &Message) -> bool {
        (self.created_at, self.id) > (other.created_at, other.id)
    }
}

/// Message record before persistence
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub queue: QueueName,
    pub author: String,
    pub content: String,
    pub created_at: i64,
}

/// Opaque message payload
///
/// Strings are stored verbatim; any other JSON value is stored as its
/// serialized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent(String);

impl MessageContent {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => Self(s),
            other => Self(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}
