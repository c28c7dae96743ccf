// bcrypt CredentialHasher

use qnd_core::error::{AppError, Result};
use qnd_core::port::CredentialHasher;
use tracing::debug;

pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    /// Hasher with an explicit work factor (4..=31)
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl CredentialHasher for BcryptHasher {
    fn hash(&self, password: &str) -> Result<String> {
        bcrypt::hash(password, self.cost)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        match bcrypt::verify(password, hash) {
            Ok(matches) => matches,
            Err(e) => {
                debug!(error = %e, "Stored password hash is unreadable");
                false
            }
        }
    }
}
