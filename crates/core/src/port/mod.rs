// Port Layer - Interfaces for external dependencies

pub mod credentials;
pub mod message_repository;
pub mod principal_repository;
pub mod time_provider;
pub mod transaction;

// Re-exports
pub use credentials::{CredentialHasher, IssuedToken, TokenSigner};
pub use message_repository::MessageRepository;
pub use principal_repository::PrincipalRepository;
pub use time_provider::{SystemTimeProvider, TimeProvider};
pub use transaction::{StoreTransaction, Transaction, TransactionalStore};
