// SQLite PrincipalRepository Implementation

use crate::error::map_sqlx_error;
use crate::queries::{self, PrincipalRow};
use async_trait::async_trait;
use qnd_core::domain::{NewPrincipal, Principal, PrincipalId};
use qnd_core::error::Result;
use qnd_core::port::PrincipalRepository;
use sqlx::SqlitePool;

pub struct SqlitePrincipalRepository {
    pool: SqlitePool,
}

impl SqlitePrincipalRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PrincipalRepository for SqlitePrincipalRepository {
    async fn insert(&self, principal: &NewPrincipal) -> Result<Principal> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO principals (username, queue, password_hash) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(&principal.username)
        .bind(&principal.queue)
        .bind(&principal.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(Principal {
            id,
            username: principal.username.clone(),
            queue: principal.queue.clone(),
            password_hash: principal.password_hash.clone(),
        })
    }

    async fn find_by_id(&self, id: PrincipalId) -> Result<Option<Principal>> {
        let row = sqlx::query_as::<_, PrincipalRow>(
            "SELECT id, username, queue, password_hash FROM principals WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(PrincipalRow::into_principal))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Principal>> {
        queries::principal_by_username(&self.pool, username).await
    }

    async fn find_by_queue(&self, queue: &str) -> Result<Option<Principal>> {
        queries::principal_by_queue(&self.pool, queue).await
    }

    async fn list_all(&self) -> Result<Vec<Principal>> {
        let rows = sqlx::query_as::<_, PrincipalRow>(
            "SELECT id, username, queue, password_hash FROM principals ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PrincipalRow::into_principal).collect())
    }

    async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM principals")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }
}
