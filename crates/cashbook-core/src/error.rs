//! Error types for cashbook-core

use thiserror::Error;

/// Result type alias using cashbook-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in cashbook-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// The local queue store could not be opened
    #[error("Offline storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A record could not be written to an open store
    #[error("Could not save transaction offline: {0}")]
    EnqueueFailed(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Queue record not found
    #[error("Queue record not found: {0}")]
    NotFound(i64),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
