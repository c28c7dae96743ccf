// Credential ports (authentication collaborator)
//
// Hashing scheme and token format are owned by the adapters; the core only
// sees opaque hashes and tokens.

use crate::domain::PrincipalId;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Password hashing scheme
#[cfg_attr(test, mockall::automock)]
pub trait CredentialHasher: Send + Sync {
    /// Hash a plaintext password
    fn hash(&self, password: &str) -> Result<String>;

    /// Check a plaintext password against a stored hash.
    ///
    /// A malformed hash verifies as false.
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// A signed, short-lived credential substitute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedToken {
    pub token: String,
    /// Lifetime in seconds
    pub duration: i64,
    /// Expiry, epoch seconds
    pub expires_at: i64,
}

/// Token issuance and verification
#[cfg_attr(test, mockall::automock)]
pub trait TokenSigner: Send + Sync {
    /// Issue a token for `principal`, valid from `now_secs` for the signer's lifetime
    fn issue(&self, principal: PrincipalId, now_secs: i64) -> Result<IssuedToken>;

    /// Verify a token at `now_secs`.
    ///
    /// Returns the principal id for a valid, unexpired token; `None` for a bad
    /// signature, a malformed token or an expired one.
    fn verify(&self, token: &str, now_secs: i64) -> Option<PrincipalId>;
}
