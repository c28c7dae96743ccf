// qnd Infrastructure - SQLite Adapter
// Implements: PrincipalRepository, MessageRepository, TransactionalStore

mod connection;
mod error;
mod message_repository;
mod migration;
mod principal_repository;
mod queries;
mod transaction;

pub use connection::create_pool;
pub use message_repository::SqliteMessageRepository;
pub use migration::run_migrations;
pub use principal_repository::SqlitePrincipalRepository;
pub use transaction::SqliteStoreTransaction;

// Note: sqlx::Error conversion is handled by map_sqlx_error
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)
