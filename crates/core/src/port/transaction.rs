// Transaction port for atomic operations

use crate::domain::{Message, MessageId, Principal, PrincipalId};
use crate::error::Result;
use async_trait::async_trait;

/// Transaction trait for atomic multi-step operations
#[async_trait]
pub trait Transaction: Send {
    /// Commit the transaction
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Rollback the transaction
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Store that can open write transactions spanning principals and messages.
///
/// Implementations must take the write lock when the transaction begins, so
/// that two transactions on the same queue never act on the same stale read.
#[async_trait]
pub trait TransactionalStore: Send + Sync {
    /// Begin a new write transaction
    async fn begin_transaction(&self) -> Result<Box<dyn StoreTransaction>>;
}

/// Store operations within a transaction
#[async_trait]
pub trait StoreTransaction: Transaction {
    /// Find principal by username (within transaction)
    async fn find_principal(&mut self, username: &str) -> Result<Option<Principal>>;

    /// Find the principal bound to a queue (within transaction)
    async fn find_queue_owner(&mut self, queue: &str) -> Result<Option<Principal>>;

    /// Overwrite username, queue and password hash of an existing principal
    async fn update_principal(&mut self, principal: &Principal) -> Result<()>;

    /// Delete a principal. Returns false if absent.
    async fn delete_principal(&mut self, id: PrincipalId) -> Result<bool>;

    /// Queue snapshot in arrival order (created_at ASC, id ASC)
    async fn list_messages(&mut self, queue: &str) -> Result<Vec<Message>>;

    /// Delete the given messages, returning how many were removed
    async fn delete_messages(&mut self, ids: &[MessageId]) -> Result<u64>;

    /// Delete every message of a queue
    async fn clear_queue(&mut self, queue: &str) -> Result<u64>;

    /// Move every message tagged `from` to queue `to`
    async fn retag_queue(&mut self, from: &str, to: &str) -> Result<u64>;

    /// Rewrite the author of every message written by `from`
    async fn retag_author(&mut self, from: &str, to: &str) -> Result<u64>;
}
