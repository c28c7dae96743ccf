// Queue Domain Model

use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Queue identifier. The empty string is reserved as the administrator marker.
pub type QueueName = String;

/// Maximum length of usernames and queue names (characters)
pub const MAX_NAME_LEN: usize = 32;

/// Validate a queue name for binding to a principal.
///
/// The empty name is accepted: it marks an administrative principal.
pub fn validate_queue_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Ok(());
    }
    check_name(name).map_err(DomainError::InvalidQueueName)
}

/// Shared name rules for usernames and queue names
pub(crate) fn check_name(name: &str) -> std::result::Result<(), String> {
    if name.chars().count() > MAX_NAME_LEN {
        return Err(format!(
            "'{}' is too long (max {} characters)",
            name, MAX_NAME_LEN
        ));
    }
    if name.trim() != name {
        return Err(format!("'{}' has leading or trailing whitespace", name));
    }
    if name.chars().any(char::is_control) {
        return Err("contains control characters".to_string());
    }
    Ok(())
}

/// Message count for one queue, as shown by the management overview
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSummary {
    pub queue: QueueName,
    /// Username bound to the queue, `None` for orphaned queues
    pub owner: Option<String>,
    pub message_count: i64,
}
