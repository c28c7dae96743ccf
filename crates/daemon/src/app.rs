// Service wiring (dependency injection)

use anyhow::{Context, Result};
use qnd_api_rpc::RpcHandler;
use qnd_core::application::{
    AccessGuard, AuthService, DeletePolicy, IdentityDirectory, MessageService,
    QueueLifecycleManager, QueueRegistry,
};
use qnd_core::port::{
    CredentialHasher, MessageRepository, PrincipalRepository, SystemTimeProvider, TimeProvider,
    TokenSigner, TransactionalStore,
};
use qnd_infra_auth::{BcryptHasher, HmacTokenSigner};
use qnd_infra_sqlite::{
    create_pool, run_migrations, SqliteMessageRepository, SqlitePrincipalRepository,
};
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Settings the services need beyond the store
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub secret_key: Vec<u8>,
    pub token_ttl_secs: i64,
    pub delete_policy: DeletePolicy,
    pub bcrypt_cost: u32,
}

/// Open (creating if needed) the database and bring the schema up to date
pub async fn open_store(db_path: &str) -> Result<SqlitePool> {
    if !db_path.contains(":memory:") {
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory {}", parent.display())
                })?;
            }
        }
    }

    info!(db_path = %db_path, "Initializing database...");

    let pool = create_pool(db_path)
        .await
        .map_err(|e| anyhow::anyhow!("DB pool creation failed: {}", e))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    Ok(pool)
}

/// Build the RPC handler and every service behind it over one pool
pub fn build_handler(pool: SqlitePool, settings: &ServiceSettings) -> Arc<RpcHandler> {
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);

    let principals: Arc<dyn PrincipalRepository> =
        Arc::new(SqlitePrincipalRepository::new(pool.clone()));
    let message_repo = Arc::new(SqliteMessageRepository::new(pool));
    let messages: Arc<dyn MessageRepository> = message_repo.clone();
    let store: Arc<dyn TransactionalStore> = message_repo;

    let hasher: Arc<dyn CredentialHasher> = Arc::new(BcryptHasher::new(settings.bcrypt_cost));
    let tokens: Arc<dyn TokenSigner> = Arc::new(HmacTokenSigner::new(
        settings.secret_key.clone(),
        settings.token_ttl_secs,
    ));

    let guard = Arc::new(AccessGuard::new(principals.clone()));
    let lifecycle = Arc::new(QueueLifecycleManager::new(
        store.clone(),
        settings.delete_policy,
    ));

    let auth = Arc::new(AuthService::new(
        principals.clone(),
        hasher.clone(),
        tokens,
        time_provider.clone(),
    ));
    let directory = Arc::new(IdentityDirectory::new(principals.clone(), hasher, lifecycle));
    let registry = Arc::new(QueueRegistry::new(principals, messages.clone()));
    let message_service = Arc::new(MessageService::new(
        guard.clone(),
        messages,
        store,
        time_provider,
    ));

    Arc::new(RpcHandler::new(
        auth,
        guard,
        message_service,
        directory,
        registry,
    ))
}
