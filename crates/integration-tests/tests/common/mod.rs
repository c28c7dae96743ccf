//! Shared wiring for integration tests: real SQLite, real credential
//! adapters, a manual clock.

#![allow(dead_code)]

use qnd_core::application::{
    AccessGuard, AuthService, CreatePrincipalRequest, DeletePolicy, IdentityDirectory,
    MessageService, QueueLifecycleManager, QueueRegistry,
};
use qnd_core::domain::Principal;
use qnd_core::port::time_provider::mocks::ManualClock;
use qnd_core::port::{MessageRepository, PrincipalRepository, TransactionalStore};
use qnd_infra_auth::{BcryptHasher, HmacTokenSigner};
use qnd_infra_sqlite::{
    create_pool, run_migrations, SqliteMessageRepository, SqlitePrincipalRepository,
};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;

/// Lowest bcrypt cost, keeps tests fast
pub const TEST_BCRYPT_COST: u32 = 4;

pub struct Harness {
    pub pool: SqlitePool,
    pub clock: Arc<ManualClock>,
    pub auth: Arc<AuthService>,
    pub directory: Arc<IdentityDirectory>,
    pub registry: Arc<QueueRegistry>,
    pub messages: Arc<MessageService>,
    pub store: Arc<SqliteMessageRepository>,
}

impl Harness {
    pub async fn in_memory(policy: DeletePolicy) -> Self {
        Self::open("sqlite::memory:", policy).await
    }

    pub async fn open(url: &str, policy: DeletePolicy) -> Self {
        let pool = create_pool(url).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let clock = Arc::new(ManualClock::new(1_000));
        let principals: Arc<dyn PrincipalRepository> =
            Arc::new(SqlitePrincipalRepository::new(pool.clone()));
        let store = Arc::new(SqliteMessageRepository::new(pool.clone()));
        let message_repo: Arc<dyn MessageRepository> = store.clone();
        let tx_store: Arc<dyn TransactionalStore> = store.clone();
        let hasher = Arc::new(BcryptHasher::new(TEST_BCRYPT_COST));

        let guard = Arc::new(AccessGuard::new(principals.clone()));
        let lifecycle = Arc::new(QueueLifecycleManager::new(tx_store.clone(), policy));

        Self {
            auth: Arc::new(AuthService::new(
                principals.clone(),
                hasher.clone(),
                Arc::new(HmacTokenSigner::new("integration-secret", 600)),
                clock.clone(),
            )),
            directory: Arc::new(IdentityDirectory::new(principals.clone(), hasher, lifecycle)),
            registry: Arc::new(QueueRegistry::new(principals, message_repo.clone())),
            messages: Arc::new(MessageService::new(
                guard,
                message_repo,
                tx_store,
                clock.clone(),
            )),
            clock,
            store,
            pool,
        }
    }

    pub async fn user(&self, username: &str, queue: &str) -> Principal {
        self.directory
            .create(CreatePrincipalRequest {
                username: username.to_string(),
                password: format!("{}-password", username),
                queue: queue.to_string(),
            })
            .await
            .unwrap()
    }

    /// Append `content` to the principal's own queue at time `at`
    pub async fn post_at(&self, who: &Principal, content: &str, at: i64) -> i64 {
        self.clock.set(at);
        self.messages
            .append(
                who,
                &who.queue,
                qnd_core::domain::MessageContent::new(content),
            )
            .await
            .unwrap()
            .id
    }
}

/// Unique on-disk database path, removed (with WAL files) on drop
pub struct TempDb {
    pub path: PathBuf,
}

impl TempDb {
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!("qnd-test-{}.db", uuid::Uuid::new_v4()));
        Self { path }
    }

    pub fn url(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}
