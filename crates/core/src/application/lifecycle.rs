// Queue Lifecycle Manager
//
// Owns every change that has to keep message tags consistent with the
// directory: renames, rebinding to another queue and principal deletion.
// Each change runs in a single write transaction.

use crate::domain::Principal;
use crate::error::{AppError, Result};
use crate::port::{StoreTransaction, TransactionalStore};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

/// What happens to a queue's messages when its principal is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePolicy {
    /// Leave them in place; they reappear if the queue name is bound again
    #[default]
    Retain,
    /// Delete them together with the principal
    Cascade,
}

impl FromStr for DeletePolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "retain" => Ok(DeletePolicy::Retain),
            "cascade" => Ok(DeletePolicy::Cascade),
            other => Err(AppError::Config(format!(
                "unknown delete policy '{}' (expected retain or cascade)",
                other
            ))),
        }
    }
}

/// Requested change to an existing principal. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct Rebinding {
    pub username: String,
    pub new_username: Option<String>,
    pub new_queue: Option<String>,
    pub new_password_hash: Option<String>,
}

/// Result of a committed rebinding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebindOutcome {
    pub principal: Principal,
    /// Messages moved from the old queue to the new one
    pub moved_messages: u64,
    /// Messages whose author was renamed
    pub reauthored_messages: u64,
}

pub struct QueueLifecycleManager {
    store: Arc<dyn TransactionalStore>,
    policy: DeletePolicy,
}

impl QueueLifecycleManager {
    pub fn new(store: Arc<dyn TransactionalStore>, policy: DeletePolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> DeletePolicy {
        self.policy
    }

    /// Apply a rename/rebind and cascade it to stored messages atomically.
    ///
    /// Messages tagged with the old queue move to the new queue (both names
    /// non-empty); messages authored under the old username get the new one.
    ///
    /// # Errors
    /// - AppError::NotFound if the principal does not exist
    /// - AppError::Conflict if the new username or queue is taken
    pub async fn rebind(&self, change: Rebinding) -> Result<RebindOutcome> {
        let mut tx = self.store.begin_transaction().await?;

        match apply_rebind(tx.as_mut(), &change).await {
            Ok(outcome) => {
                tx.commit().await?;
                info!(
                    username = %outcome.principal.username,
                    queue = %outcome.principal.queue,
                    moved = outcome.moved_messages,
                    reauthored = outcome.reauthored_messages,
                    "Principal rebound"
                );
                Ok(outcome)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = ?rollback_err, "Rollback after failed rebind failed");
                }
                Err(e)
            }
        }
    }

    /// Delete a principal. Returns false if it did not exist.
    ///
    /// Its queue's messages are kept or removed according to the policy.
    pub async fn delete_principal(&self, username: &str) -> Result<bool> {
        let mut tx = self.store.begin_transaction().await?;

        match apply_delete(tx.as_mut(), username, self.policy).await {
            Ok(Some(removed_messages)) => {
                tx.commit().await?;
                info!(
                    username = %username,
                    policy = ?self.policy,
                    removed_messages,
                    "Principal deleted"
                );
                Ok(true)
            }
            Ok(None) => {
                tx.rollback().await?;
                Ok(false)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = ?rollback_err, "Rollback after failed delete failed");
                }
                Err(e)
            }
        }
    }
}

async fn apply_rebind(tx: &mut dyn StoreTransaction, change: &Rebinding) -> Result<RebindOutcome> {
    let current = tx
        .find_principal(&change.username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", change.username)))?;

    let mut updated = current.clone();

    if let Some(new_username) = &change.new_username {
        if *new_username != current.username {
            if tx.find_principal(new_username).await?.is_some() {
                return Err(AppError::Conflict(format!(
                    "User {} already exists",
                    new_username
                )));
            }
            updated.username = new_username.clone();
        }
    }

    if let Some(new_queue) = &change.new_queue {
        if *new_queue != current.queue {
            if let Some(owner) = tx.find_queue_owner(new_queue).await? {
                if owner.id != current.id {
                    return Err(AppError::Conflict(format!(
                        "Queue {} is already bound to {}",
                        new_queue, owner.username
                    )));
                }
            }
            updated.queue = new_queue.clone();
        }
    }

    if let Some(hash) = &change.new_password_hash {
        updated.password_hash = hash.clone();
    }

    tx.update_principal(&updated).await?;

    // Queue cascade: only between two real queues. Demoting to admin leaves
    // the old queue orphaned; promoting an admin has nothing to move.
    let moved_messages = if updated.queue != current.queue
        && !current.queue.is_empty()
        && !updated.queue.is_empty()
    {
        tx.retag_queue(&current.queue, &updated.queue).await?
    } else {
        0
    };

    let reauthored_messages = if updated.username != current.username {
        tx.retag_author(&current.username, &updated.username).await?
    } else {
        0
    };

    Ok(RebindOutcome {
        principal: updated,
        moved_messages,
        reauthored_messages,
    })
}

/// `Ok(None)` when the principal does not exist
async fn apply_delete(
    tx: &mut dyn StoreTransaction,
    username: &str,
    policy: DeletePolicy,
) -> Result<Option<u64>> {
    let Some(principal) = tx.find_principal(username).await? else {
        return Ok(None);
    };

    tx.delete_principal(principal.id).await?;

    let removed = match policy {
        DeletePolicy::Cascade if !principal.queue.is_empty() => {
            tx.clear_queue(&principal.queue).await?
        }
        _ => 0,
    };

    Ok(Some(removed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_policy_parse() {
        assert_eq!("retain".parse::<DeletePolicy>().unwrap(), DeletePolicy::Retain);
        assert_eq!("CASCADE".parse::<DeletePolicy>().unwrap(), DeletePolicy::Cascade);
        assert!("purge".parse::<DeletePolicy>().is_err());
    }

    #[test]
    fn test_default_policy_keeps_messages() {
        assert_eq!(DeletePolicy::default(), DeletePolicy::Retain);
    }
}
