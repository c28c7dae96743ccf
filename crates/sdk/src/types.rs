//! SDK Request/Response Types
//!
//! Mirrors the JSON-RPC types of the qnd surfaces.

use serde::{Deserialize, Serialize};

/// Credentials sent as the `auth` parameter
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Auth {
    Token { token: String },
    Password { username: String, password: String },
}

impl Auth {
    pub fn token(token: impl Into<String>) -> Self {
        Auth::Token {
            token: token.into(),
        }
    }

    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Auth::Password {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Auth::Token { .. } => f.write_str("Auth::Token(..)"),
            Auth::Password { username, .. } => write!(f, "Auth::Password({}, ..)", username),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VersionResponse {
    pub version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    /// Lifetime in seconds
    pub duration: i64,
}

/// A stored queue message
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Message {
    pub id: i64,
    pub queue: String,
    pub author: String,
    pub content: String,
    /// Epoch milliseconds
    pub created_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostResponse {
    pub id: i64,
    pub queue: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse {
    pub queue: String,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClearResponse {
    pub queue: String,
    pub removed: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TruncateResponse {
    pub queue: String,
    pub removed: u64,
    pub kept: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteMessageResponse {
    pub id: i64,
    pub deleted: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstallResponse {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsersResponse {
    pub usernames: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserView {
    pub id: i64,
    pub username: String,
    pub queue: String,
    pub admin: bool,
}

/// Changes for admin.users.update.v1; `None` leaves a field as is
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateUser {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteUserResponse {
    pub username: String,
    pub deleted: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueuesResponse {
    pub administrators: Vec<String>,
    pub queues: Vec<OwnedQueue>,
    pub orphaned: Vec<OrphanedQueue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OwnedQueue {
    pub owner: String,
    pub queue: String,
    pub messages: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrphanedQueue {
    pub queue: String,
    pub messages: i64,
}
