//! RPC Request/Response Types
//!
//! Parameters are named objects. Authenticated methods carry `auth`.

use qnd_core::application::UpdatePrincipalRequest;
use qnd_core::domain::{Credentials, Message, MessageId, Principal, PrincipalId};
use serde::{Deserialize, Serialize};

/// api.version.v1
#[derive(Debug, Clone, Serialize)]
pub struct VersionResponse {
    pub version: String,
}

/// Requests that carry nothing but credentials
/// (api.token.v1, admin.users.list.v1, admin.queues.v1)
#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    pub auth: Credentials,
}

/// api.token.v1
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub token: String,
    /// Lifetime in seconds
    pub duration: i64,
}

/// queue.post.v1 - Append to a queue
#[derive(Debug, Deserialize)]
pub struct PostRequest {
    pub auth: Credentials,
    pub queue: String,
    /// Any JSON value; strings are stored as-is
    pub content: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostResponse {
    pub id: MessageId,
    pub queue: String,
}

/// queue.list.v1 / queue.clear.v1 / queue.truncate.v1
#[derive(Debug, Deserialize)]
pub struct QueueRequest {
    pub auth: Credentials,
    pub queue: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListResponse {
    pub queue: String,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub queue: String,
    pub removed: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TruncateResponse {
    pub queue: String,
    pub removed: u64,
    pub kept: Option<MessageId>,
}

/// message.delete.v1
#[derive(Debug, Deserialize)]
pub struct DeleteMessageRequest {
    pub auth: Credentials,
    pub id: MessageId,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteMessageResponse {
    pub id: MessageId,
    pub deleted: bool,
}

/// admin.install.v1 - Bootstrap the first administrator
#[derive(Debug, Deserialize)]
pub struct InstallRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstallResponse {
    pub id: PrincipalId,
    pub username: String,
}

/// admin.users.list.v1
#[derive(Debug, Clone, Serialize)]
pub struct UsersResponse {
    pub usernames: Vec<String>,
}

/// admin.users.get.v1
#[derive(Debug, Deserialize)]
pub struct GetUserRequest {
    pub auth: Credentials,
    pub id: PrincipalId,
}

/// Principal as shown to administrators (never includes the hash)
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: PrincipalId,
    pub username: String,
    pub queue: String,
    pub admin: bool,
}

impl From<Principal> for UserView {
    fn from(p: Principal) -> Self {
        let admin = p.is_admin();
        Self {
            id: p.id,
            username: p.username,
            queue: p.queue,
            admin,
        }
    }
}

/// admin.users.create.v1
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub auth: Credentials,
    pub username: String,
    pub password: String,
    /// "" creates an administrator
    #[serde(default)]
    pub queue: String,
}

/// admin.users.update.v1
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub auth: Credentials,
    pub username: String,
    #[serde(default)]
    pub new_username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub queue: Option<String>,
}

impl UpdateUserRequest {
    pub fn into_directory_request(self) -> UpdatePrincipalRequest {
        UpdatePrincipalRequest {
            username: self.username,
            new_username: self.new_username,
            password: self.password,
            queue: self.queue,
        }
    }
}

/// admin.users.delete.v1
#[derive(Debug, Deserialize)]
pub struct DeleteUserRequest {
    pub auth: Credentials,
    pub username: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteUserResponse {
    pub username: String,
    pub deleted: bool,
}

/// admin.queues.v1
#[derive(Debug, Clone, Serialize)]
pub struct QueuesResponse {
    pub administrators: Vec<String>,
    pub queues: Vec<OwnedQueue>,
    pub orphaned: Vec<OrphanedQueue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnedQueue {
    pub owner: String,
    pub queue: String,
    pub messages: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrphanedQueue {
    pub queue: String,
    pub messages: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_auth_accepts_token_or_password() {
        let req: QueueRequest =
            serde_json::from_value(json!({"auth": {"token": "t"}, "queue": "orders"})).unwrap();
        assert!(matches!(req.auth, Credentials::Token { .. }));

        let req: QueueRequest = serde_json::from_value(json!({
            "auth": {"username": "alice", "password": "pw"},
            "queue": "orders"
        }))
        .unwrap();
        assert!(matches!(req.auth, Credentials::Password { .. }));
    }

    #[test]
    fn test_user_view_hides_hash() {
        let view = UserView::from(Principal {
            id: 1,
            username: "root".into(),
            queue: String::new(),
            password_hash: "$2b$secret".into(),
        });
        let value = serde_json::to_value(&view).unwrap();

        assert_eq!(value["admin"], json!(true));
        assert!(!value.to_string().contains("secret"));
    }
}
