// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Invalid queue name: {0}")]
    InvalidQueueName(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
