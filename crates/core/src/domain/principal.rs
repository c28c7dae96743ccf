// Principal Domain Model

use super::error::{DomainError, Result};
use super::queue::{check_name, validate_queue_name, QueueName};
use serde::{Deserialize, Serialize};

/// Principal ID (SQLite rowid)
pub type PrincipalId = i64;

/// An identity that can authenticate and, unless administrative, owns one queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    pub username: String,
    /// Bound queue, `""` for administrators
    pub queue: QueueName,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
}

impl Principal {
    /// Administrators carry no queue binding
    pub fn is_admin(&self) -> bool {
        self.queue.is_empty()
    }

    /// True if this principal is bound to exactly `queue`.
    ///
    /// Case-sensitive; the empty name never matches.
    pub fn owns(&self, queue: &str) -> bool {
        !queue.is_empty() && self.queue == queue
    }
}

/// Principal record before persistence (id assigned by the store)
#[derive(Debug, Clone)]
pub struct NewPrincipal {
    pub username: String,
    pub queue: QueueName,
    pub password_hash: String,
}

/// Validate a username
pub fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(DomainError::InvalidUsername("username is empty".to_string()));
    }
    check_name(username).map_err(DomainError::InvalidUsername)
}

/// Validate a plaintext password supplied for a new principal
pub fn validate_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(DomainError::InvalidPassword("password is empty".to_string()));
    }
    Ok(())
}

/// Validate the username/queue pair of a principal
pub fn validate_binding(username: &str, queue: &str) -> Result<()> {
    validate_username(username)?;
    validate_queue_name(queue)
}
