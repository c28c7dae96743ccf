// Shared SQL used by both pooled repositories and open transactions

use crate::error::map_sqlx_error;
use qnd_core::domain::{Message, MessageId, Principal};
use qnd_core::error::Result;
use sqlx::{SqliteConnection, SqliteExecutor};

/// Bound-parameter ceiling per statement (SQLITE_MAX_VARIABLE_NUMBER floor)
const DELETE_CHUNK: usize = 500;

#[derive(sqlx::FromRow)]
pub(crate) struct PrincipalRow {
    id: i64,
    username: String,
    queue: String,
    password_hash: String,
}

impl PrincipalRow {
    pub(crate) fn into_principal(self) -> Principal {
        Principal {
            id: self.id,
            username: self.username,
            queue: self.queue,
            password_hash: self.password_hash,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct MessageRow {
    id: i64,
    queue: String,
    author: String,
    content: String,
    created_at: i64,
}

impl MessageRow {
    pub(crate) fn into_message(self) -> Message {
        Message {
            id: self.id,
            queue: self.queue,
            author: self.author,
            content: self.content,
            created_at: self.created_at,
        }
    }
}

pub(crate) async fn principal_by_username<'e, E>(
    executor: E,
    username: &str,
) -> Result<Option<Principal>>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query_as::<_, PrincipalRow>(
        "SELECT id, username, queue, password_hash FROM principals WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(executor)
    .await
    .map_err(map_sqlx_error)?;

    Ok(row.map(PrincipalRow::into_principal))
}

/// Owner of a named queue; the empty administrator marker never has one
pub(crate) async fn principal_by_queue<'e, E>(
    executor: E,
    queue: &str,
) -> Result<Option<Principal>>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query_as::<_, PrincipalRow>(
        "SELECT id, username, queue, password_hash FROM principals WHERE queue = ? AND queue <> ''",
    )
    .bind(queue)
    .fetch_optional(executor)
    .await
    .map_err(map_sqlx_error)?;

    Ok(row.map(PrincipalRow::into_principal))
}

/// Queue snapshot ordered by created_at, then id
pub(crate) async fn messages_in_queue<'e, E>(executor: E, queue: &str) -> Result<Vec<Message>>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query_as::<_, MessageRow>(
        r#"
        SELECT id, queue, author, content, created_at
        FROM messages
        WHERE queue = ?
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(queue)
    .fetch_all(executor)
    .await
    .map_err(map_sqlx_error)?;

    Ok(rows.into_iter().map(MessageRow::into_message).collect())
}

pub(crate) async fn clear_queue<'e, E>(executor: E, queue: &str) -> Result<u64>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM messages WHERE queue = ?")
        .bind(queue)
        .execute(executor)
        .await
        .map_err(map_sqlx_error)?;

    Ok(result.rows_affected())
}

/// Delete a batch of messages by id, chunked to stay under the bind limit
pub(crate) async fn delete_messages(conn: &mut SqliteConnection, ids: &[MessageId]) -> Result<u64> {
    let mut removed = 0;

    for chunk in ids.chunks(DELETE_CHUNK) {
        let placeholders = vec!["?"; chunk.len()].join(", ");
        let sql = format!("DELETE FROM messages WHERE id IN ({})", placeholders);

        let mut query = sqlx::query(&sql);
        for id in chunk {
            query = query.bind(*id);
        }

        removed += query
            .execute(&mut *conn)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();
    }

    Ok(removed)
}
