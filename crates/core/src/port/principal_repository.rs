// Principal Repository Port (Identity Directory storage)

use crate::domain::{NewPrincipal, Principal, PrincipalId};
use crate::error::Result;
use async_trait::async_trait;

/// Repository interface for Principal persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PrincipalRepository: Send + Sync {
    /// Insert a new principal.
    ///
    /// # Errors
    /// - AppError::Conflict if the username (or non-empty queue) is taken
    async fn insert(&self, principal: &NewPrincipal) -> Result<Principal>;

    /// Find principal by ID
    async fn find_by_id(&self, id: PrincipalId) -> Result<Option<Principal>>;

    /// Find principal by username
    async fn find_by_username(&self, username: &str) -> Result<Option<Principal>>;

    /// Find the principal bound to a queue (never matches the empty name)
    async fn find_by_queue(&self, queue: &str) -> Result<Option<Principal>>;

    /// All principals ordered by id
    async fn list_all(&self) -> Result<Vec<Principal>>;

    /// Number of principals
    async fn count(&self) -> Result<i64>;
}
