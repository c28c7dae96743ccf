// Domain Layer - Pure business logic and entities

pub mod credentials;
pub mod error;
pub mod message;
pub mod principal;
pub mod queue;

// Re-exports
pub use credentials::Credentials;
pub use error::DomainError;
pub use message::{Message, MessageContent, MessageId, NewMessage};
pub use principal::{
    validate_binding, validate_password, validate_username, NewPrincipal, Principal, PrincipalId,
};
pub use queue::{validate_queue_name, QueueName, QueueSummary, MAX_NAME_LEN};
