// Access Control Guard
//
// Every message operation goes through here before touching the store.
// Decisions are made against the principal's *current* directory record, so a
// token issued before a rename or deletion cannot reach the old queue.

use crate::domain::Principal;
use crate::error::{AppError, Result};
use crate::port::PrincipalRepository;
use std::sync::Arc;
use tracing::debug;

/// Outcome of an access check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// Carries the requester's current record
    Allow(Principal),
    Deny(String),
}

pub struct AccessGuard {
    principals: Arc<dyn PrincipalRepository>,
}

impl AccessGuard {
    pub fn new(principals: Arc<dyn PrincipalRepository>) -> Self {
        Self { principals }
    }

    /// Decide whether `requester` may operate on `queue`.
    ///
    /// Allow iff the requester still exists and is bound to exactly `queue`.
    /// Administrators (empty binding) are always denied.
    pub async fn check(&self, requester: &Principal, queue: &str) -> Result<Access> {
        let Some(current) = self.principals.find_by_id(requester.id).await? else {
            return Ok(Access::Deny(format!(
                "principal {} no longer exists",
                requester.username
            )));
        };

        if current.owns(queue) {
            Ok(Access::Allow(current))
        } else {
            Ok(Access::Deny(format!(
                "{} is not bound to queue '{}'",
                current.username, queue
            )))
        }
    }

    /// Like [`check`](Self::check) but turns a denial into `AppError::Unauthorized`
    pub async fn authorize(&self, requester: &Principal, queue: &str) -> Result<Principal> {
        match self.check(requester, queue).await? {
            Access::Allow(principal) => Ok(principal),
            Access::Deny(reason) => {
                debug!(requester = %requester.username, queue = %queue, %reason, "Access denied");
                Err(AppError::Unauthorized(reason))
            }
        }
    }

    /// Require a requester bound to some queue (used before the target queue is known)
    pub async fn authorize_queue_user(&self, requester: &Principal) -> Result<Principal> {
        match self.principals.find_by_id(requester.id).await? {
            Some(current) if !current.is_admin() => Ok(current),
            Some(current) => Err(AppError::unauthorized(format!(
                "{} is an administrator and has no queue",
                current.username
            ))),
            None => Err(AppError::unauthorized(format!(
                "principal {} no longer exists",
                requester.username
            ))),
        }
    }

    /// Require an administrative requester (directory management only)
    pub async fn authorize_admin(&self, requester: &Principal) -> Result<Principal> {
        match self.principals.find_by_id(requester.id).await? {
            Some(current) if current.is_admin() => Ok(current),
            Some(current) => Err(AppError::unauthorized(format!(
                "{} is not an administrator",
                current.username
            ))),
            None => Err(AppError::unauthorized(format!(
                "principal {} no longer exists",
                requester.username
            ))),
        }
    }
}
