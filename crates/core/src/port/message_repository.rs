// Message Repository Port (Message Store)

use crate::domain::{Message, MessageId, NewMessage, PrincipalId};
use crate::error::Result;
use async_trait::async_trait;

/// Repository interface for Message persistence.
///
/// Writes that act on behalf of a principal carry its id and only apply
/// while that principal is still bound to the queue, so a rebind committed
/// after the access check cannot be overtaken.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Append a message; the store assigns a fresh, strictly increasing id.
    ///
    /// Inserts only while principal `owner` is named `message.author` and
    /// bound to `message.queue`. Returns `None` when it no longer is.
    async fn append(&self, owner: PrincipalId, message: &NewMessage) -> Result<Option<Message>>;

    /// Find message by ID
    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>>;

    /// Snapshot of a queue ordered by created_at ASC, id ASC
    async fn list_by_queue(&self, queue: &str) -> Result<Vec<Message>>;

    /// Delete a message only if it is still tagged with `queue` and
    /// principal `owner` is still bound to `queue`.
    /// Returns false otherwise.
    async fn delete_in_queue(&self, id: MessageId, owner: PrincipalId, queue: &str)
        -> Result<bool>;

    /// Message count of one queue
    async fn count_by_queue(&self, queue: &str) -> Result<i64>;

    /// Message counts of every queue that holds messages, ordered by name
    async fn counts_by_queue(&self) -> Result<Vec<(String, i64)>>;
}
