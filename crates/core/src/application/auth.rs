// Authentication Service
//
// Front for the authentication collaborator: turns presented credentials
// into a directory Principal, and issues short-lived tokens.

use crate::domain::{Credentials, Principal};
use crate::error::{AppError, Result};
use crate::port::{CredentialHasher, IssuedToken, PrincipalRepository, TimeProvider, TokenSigner};
use std::sync::Arc;
use tracing::debug;

pub struct AuthService {
    principals: Arc<dyn PrincipalRepository>,
    hasher: Arc<dyn CredentialHasher>,
    tokens: Arc<dyn TokenSigner>,
    time_provider: Arc<dyn TimeProvider>,
}

impl AuthService {
    pub fn new(
        principals: Arc<dyn PrincipalRepository>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: Arc<dyn TokenSigner>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            principals,
            hasher,
            tokens,
            time_provider,
        }
    }

    /// Verify credentials and resolve the principal.
    ///
    /// # Errors
    /// - AppError::Unauthorized for a bad password, unknown user, or an
    ///   invalid/expired token
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Principal> {
        match credentials {
            Credentials::Token { token } => {
                let now = self.time_provider.now_secs();
                let Some(id) = self.tokens.verify(token, now) else {
                    debug!("Rejected invalid or expired token");
                    return Err(AppError::unauthorized("invalid or expired token"));
                };
                self.principals
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::unauthorized("token principal no longer exists"))
            }
            Credentials::Password { username, password } => {
                let principal = self.principals.find_by_username(username).await?;
                let Some(principal) = principal else {
                    debug!(username = %username, "Login for unknown user");
                    return Err(AppError::unauthorized("invalid credentials"));
                };

                if verify_password(&self.hasher, password, &principal.password_hash).await? {
                    Ok(principal)
                } else {
                    debug!(username = %username, "Wrong password");
                    Err(AppError::unauthorized("invalid credentials"))
                }
            }
        }
    }

    /// Issue a token for an already authenticated principal
    pub fn issue_token(&self, principal: &Principal) -> Result<IssuedToken> {
        self.tokens
            .issue(principal.id, self.time_provider.now_secs())
    }
}

/// Hash on the blocking pool; password hashing is deliberately slow
pub(crate) async fn hash_password(
    hasher: &Arc<dyn CredentialHasher>,
    password: &str,
) -> Result<String> {
    let hasher = Arc::clone(hasher);
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
}

pub(crate) async fn verify_password(
    hasher: &Arc<dyn CredentialHasher>,
    password: &str,
    hash: &str,
) -> Result<bool> {
    let hasher = Arc::clone(hasher);
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))
}
