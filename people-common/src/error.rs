//! Common error types for people-info

use thiserror::Error;

/// Common result type for people-info operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the store, config and service layers
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness constraint violated
    #[error("{0}")]
    AlreadyExists(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
