// SQLite Transaction Implementation

use crate::error::map_sqlx_error;
use crate::queries;
use async_trait::async_trait;
use qnd_core::domain::{Message, MessageId, Principal, PrincipalId};
use qnd_core::error::Result;
use qnd_core::port::{StoreTransaction, Transaction};
use sqlx::{Sqlite, Transaction as SqlxTransaction};

pub struct SqliteStoreTransaction<'a> {
    tx: SqlxTransaction<'a, Sqlite>,
}

impl<'a> SqliteStoreTransaction<'a> {
    pub fn new(tx: SqlxTransaction<'a, Sqlite>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl Transaction for SqliteStoreTransaction<'_> {
    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await.map_err(map_sqlx_error)
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await.map_err(map_sqlx_error)
    }
}

#[async_trait]
impl StoreTransaction for SqliteStoreTransaction<'_> {
    async fn find_principal(&mut self, username: &str) -> Result<Option<Principal>> {
        queries::principal_by_username(&mut *self.tx, username).await
    }

    async fn find_queue_owner(&mut self, queue: &str) -> Result<Option<Principal>> {
        queries::principal_by_queue(&mut *self.tx, queue).await
    }

    async fn update_principal(&mut self, principal: &Principal) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE principals
            SET username = ?, queue = ?, password_hash = ?
            WHERE id = ?
            "#,
        )
        .bind(&principal.username)
        .bind(&principal.queue)
        .bind(&principal.password_hash)
        .bind(principal.id)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn delete_principal(&mut self, id: PrincipalId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM principals WHERE id = ?")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_messages(&mut self, queue: &str) -> Result<Vec<Message>> {
        queries::messages_in_queue(&mut *self.tx, queue).await
    }

    async fn delete_messages(&mut self, ids: &[MessageId]) -> Result<u64> {
        queries::delete_messages(&mut *self.tx, ids).await
    }

    async fn clear_queue(&mut self, queue: &str) -> Result<u64> {
        queries::clear_queue(&mut *self.tx, queue).await
    }

    async fn retag_queue(&mut self, from: &str, to: &str) -> Result<u64> {
        let result = sqlx::query("UPDATE messages SET queue = ? WHERE queue = ?")
            .bind(to)
            .bind(from)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn retag_author(&mut self, from: &str, to: &str) -> Result<u64> {
        let result = sqlx::query("UPDATE messages SET author = ? WHERE author = ?")
            .bind(to)
            .bind(from)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
