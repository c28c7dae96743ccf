// SQLite MessageRepository Implementation

use crate::error::map_sqlx_error;
use crate::queries::{self, MessageRow};
use crate::transaction::SqliteStoreTransaction;
use async_trait::async_trait;
use qnd_core::domain::{Message, MessageId, NewMessage, PrincipalId};
use qnd_core::error::Result;
use qnd_core::port::{MessageRepository, StoreTransaction, TransactionalStore};
use sqlx::SqlitePool;

pub struct SqliteMessageRepository {
    pool: SqlitePool,
}

impl SqliteMessageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for SqliteMessageRepository {
    async fn append(&self, owner: PrincipalId, message: &NewMessage) -> Result<Option<Message>> {
        // Ownership is re-read by the INSERT itself, not trusted from the caller
        let id: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO messages (queue, author, content, created_at)
            SELECT ?, ?, ?, ?
            WHERE EXISTS (
                SELECT 1 FROM principals
                WHERE id = ? AND queue = ? AND username = ? AND queue <> ''
            )
            RETURNING id
            "#,
        )
        .bind(&message.queue)
        .bind(&message.author)
        .bind(&message.content)
        .bind(message.created_at)
        .bind(owner)
        .bind(&message.queue)
        .bind(&message.author)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(id.map(|id| Message {
            id,
            queue: message.queue.clone(),
            author: message.author.clone(),
            content: message.content.clone(),
            created_at: message.created_at,
        }))
    }

    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>> {
        let row = sqlx::query_as::<_, MessageRow>(
            "SELECT id, queue, author, content, created_at FROM messages WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(MessageRow::into_message))
    }

    async fn list_by_queue(&self, queue: &str) -> Result<Vec<Message>> {
        queries::messages_in_queue(&self.pool, queue).await
    }

    async fn delete_in_queue(
        &self,
        id: MessageId,
        owner: PrincipalId,
        queue: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM messages
            WHERE id = ? AND queue = ?
              AND EXISTS (SELECT 1 FROM principals WHERE id = ? AND queue = ?)
            "#,
        )
        .bind(id)
        .bind(queue)
        .bind(owner)
        .bind(queue)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_by_queue(&self, queue: &str) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE queue = ?")
            .bind(queue)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn counts_by_queue(&self) -> Result<Vec<(String, i64)>> {
        sqlx::query_as::<_, (String, i64)>(
            "SELECT queue, COUNT(*) FROM messages GROUP BY queue ORDER BY queue ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }
}

#[async_trait]
impl TransactionalStore for SqliteMessageRepository {
    /// Opens a write transaction up front (BEGIN IMMEDIATE) so that two
    /// read-then-delete sequences on the same queue serialize on the write
    /// lock instead of failing with SQLITE_BUSY_SNAPSHOT at first write.
    async fn begin_transaction(&self) -> Result<Box<dyn StoreTransaction>> {
        let tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(map_sqlx_error)?;

        Ok(Box::new(SqliteStoreTransaction::new(tx)))
    }
}
