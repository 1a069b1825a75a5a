//! Error types for the store module.

use edgchain_core::Digest;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// No blob is stored under this digest.
    #[error("blob not found: {0}")]
    NotFound(Digest),

    /// Stored bytes no longer hash to their key.
    #[error("blob {expected} is corrupted: content hashes to {actual}")]
    Corrupted { expected: Digest, actual: Digest },

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// Background task failed or the connection lock was poisoned.
    #[error("task error: {0}")]
    Task(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
