// Credentials presented by a caller

use serde::{Deserialize, Serialize};

/// Either a previously issued token or a username/password pair.
///
/// On the wire this is `{"token": "..."}` or
/// `{"username": "...", "password": "..."}`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Credentials {
    Token { token: String },
    Password { username: String, password: String },
}

impl Credentials {
    pub fn token(token: impl Into<String>) -> Self {
        Credentials::Token {
            token: token.into(),
        }
    }

    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials::Password {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Keep secrets out of logs
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Token { .. } => f.write_str("Credentials::Token(..)"),
            Credentials::Password { username, .. } => f
                .debug_struct("Credentials::Password")
                .field("username", username)
                .finish_non_exhaustive(),
        }
    }
}
