// Identity Directory
//
// Creates, finds, updates and deletes principals. Renames and rebinding go
// through the QueueLifecycleManager so stored messages follow the change.

use super::auth::hash_password;
use super::lifecycle::{QueueLifecycleManager, Rebinding};
use crate::domain::{
    validate_password, validate_queue_name, validate_username, NewPrincipal, Principal,
    PrincipalId,
};
use crate::error::{AppError, Result};
use crate::port::{CredentialHasher, PrincipalRepository};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Create request. An empty `queue` creates an administrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePrincipalRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub queue: String,
}

/// Update request. `None` leaves a field unchanged; an empty password too.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePrincipalRequest {
    pub username: String,
    #[serde(default)]
    pub new_username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub queue: Option<String>,
}

pub struct IdentityDirectory {
    principals: Arc<dyn PrincipalRepository>,
    hasher: Arc<dyn CredentialHasher>,
    lifecycle: Arc<QueueLifecycleManager>,
}

impl IdentityDirectory {
    pub fn new(
        principals: Arc<dyn PrincipalRepository>,
        hasher: Arc<dyn CredentialHasher>,
        lifecycle: Arc<QueueLifecycleManager>,
    ) -> Self {
        Self {
            principals,
            hasher,
            lifecycle,
        }
    }

    /// Create a principal
    ///
    /// # Errors
    /// - AppError::Domain for invalid names or an empty password
    /// - AppError::Conflict if the username exists or the queue is bound
    pub async fn create(&self, req: CreatePrincipalRequest) -> Result<Principal> {
        validate_username(&req.username)?;
        validate_queue_name(&req.queue)?;
        validate_password(&req.password)?;

        if self.principals.find_by_username(&req.username).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "User {} already exists",
                req.username
            )));
        }
        if !req.queue.is_empty() {
            if let Some(owner) = self.principals.find_by_queue(&req.queue).await? {
                return Err(AppError::Conflict(format!(
                    "Queue {} is already bound to {}",
                    req.queue, owner.username
                )));
            }
        }

        let password_hash = hash_password(&self.hasher, &req.password).await?;

        // The store's unique indexes catch a concurrent create
        let principal = self
            .principals
            .insert(&NewPrincipal {
                username: req.username,
                queue: req.queue,
                password_hash,
            })
            .await?;

        info!(
            username = %principal.username,
            queue = %principal.queue,
            admin = principal.is_admin(),
            "Principal created"
        );
        Ok(principal)
    }

    pub async fn find(&self, username: &str) -> Result<Option<Principal>> {
        self.principals.find_by_username(username).await
    }

    pub async fn find_by_id(&self, id: PrincipalId) -> Result<Option<Principal>> {
        self.principals.find_by_id(id).await
    }

    /// Update username, password and/or queue binding
    ///
    /// # Errors
    /// - AppError::NotFound if the user does not exist
    /// - AppError::Conflict if the new username or queue is taken
    pub async fn update(&self, req: UpdatePrincipalRequest) -> Result<Principal> {
        if let Some(new_username) = &req.new_username {
            validate_username(new_username)?;
        }
        if let Some(queue) = &req.queue {
            validate_queue_name(queue)?;
        }

        let new_password_hash = match req.password.as_deref() {
            Some(password) if !password.is_empty() => {
                Some(hash_password(&self.hasher, password).await?)
            }
            _ => None,
        };

        let outcome = self
            .lifecycle
            .rebind(Rebinding {
                username: req.username,
                new_username: req.new_username,
                new_queue: req.queue,
                new_password_hash,
            })
            .await?;

        Ok(outcome.principal)
    }

    /// Delete a principal. Returns false if it did not exist.
    pub async fn delete(&self, username: &str) -> Result<bool> {
        self.lifecycle.delete_principal(username).await
    }

    pub async fn list_all(&self) -> Result<Vec<Principal>> {
        self.principals.list_all().await
    }

    /// Create the first administrator of an empty directory
    ///
    /// # Errors
    /// - AppError::Conflict once any principal exists
    pub async fn install(&self, username: &str, password: &str) -> Result<Principal> {
        if self.principals.count().await? > 0 {
            return Err(AppError::Conflict("Already installed".to_string()));
        }

        self.create(CreatePrincipalRequest {
            username: username.to_string(),
            password: password.to_string(),
            queue: String::new(),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::lifecycle::DeletePolicy;
    use crate::port::credentials::MockCredentialHasher;
    use crate::port::principal_repository::MockPrincipalRepository;
    use crate::port::{StoreTransaction, TransactionalStore};
    use async_trait::async_trait;

    // The directory tests below never reach the lifecycle manager
    struct UnusedStore;

    #[async_trait]
    impl TransactionalStore for UnusedStore {
        async fn begin_transaction(&self) -> Result<Box<dyn StoreTransaction>> {
            Err(AppError::Internal("not used".to_string()))
        }
    }

    fn directory(principals: MockPrincipalRepository) -> IdentityDirectory {
        let mut hasher = MockCredentialHasher::new();
        hasher
            .expect_hash()
            .returning(|password| Ok(format!("hash:{}", password)));
        IdentityDirectory::new(
            Arc::new(principals),
            Arc::new(hasher),
            Arc::new(QueueLifecycleManager::new(
                Arc::new(UnusedStore),
                DeletePolicy::Retain,
            )),
        )
    }

    fn stored(id: i64, p: &NewPrincipal) -> Principal {
        Principal {
            id,
            username: p.username.clone(),
            queue: p.queue.clone(),
            password_hash: p.password_hash.clone(),
        }
    }

    #[tokio::test]
    async fn test_create_hashes_password() {
        let mut principals = MockPrincipalRepository::new();
        principals.expect_find_by_username().returning(|_| Ok(None));
        principals.expect_find_by_queue().returning(|_| Ok(None));
        principals
            .expect_insert()
            .withf(|p| p.password_hash == "hash:pw" && p.queue == "orders")
            .returning(|p| Ok(stored(1, p)));

        let created = directory(principals)
            .create(CreatePrincipalRequest {
                username: "alice".to_string(),
                password: "pw".to_string(),
                queue: "orders".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(created.id, 1);
        assert!(!created.is_admin());
    }

    #[tokio::test]
    async fn test_create_duplicate_username_conflicts() {
        let mut principals = MockPrincipalRepository::new();
        principals.expect_find_by_username().returning(|name| {
            Ok(Some(Principal {
                id: 1,
                username: name.to_string(),
                queue: "orders".to_string(),
                password_hash: String::new(),
            }))
        });
        principals.expect_insert().never();

        let err = directory(principals)
            .create(CreatePrincipalRequest {
                username: "alice".to_string(),
                password: "pw".to_string(),
                queue: "other".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_bound_queue_conflicts() {
        let mut principals = MockPrincipalRepository::new();
        principals.expect_find_by_username().returning(|_| Ok(None));
        principals.expect_find_by_queue().returning(|queue| {
            Ok(Some(Principal {
                id: 1,
                username: "alice".to_string(),
                queue: queue.to_string(),
                password_hash: String::new(),
            }))
        });
        principals.expect_insert().never();

        let err = directory(principals)
            .create(CreatePrincipalRequest {
                username: "mallory".to_string(),
                password: "pw".to_string(),
                queue: "orders".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_password() {
        let err = directory(MockPrincipalRepository::new())
            .create(CreatePrincipalRequest {
                username: "alice".to_string(),
                password: String::new(),
                queue: "orders".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Domain(_)));
    }

    #[tokio::test]
    async fn test_install_only_on_empty_directory() {
        let mut principals = MockPrincipalRepository::new();
        principals.expect_count().returning(|| Ok(1));
        principals.expect_insert().never();

        let err = directory(principals).install("root", "pw").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_install_creates_admin() {
        let mut principals = MockPrincipalRepository::new();
        principals.expect_count().returning(|| Ok(0));
        principals.expect_find_by_username().returning(|_| Ok(None));
        principals.expect_insert().returning(|p| Ok(stored(1, p)));

        let root = directory(principals).install("root", "pw").await.unwrap();
        assert!(root.is_admin());
    }
}
