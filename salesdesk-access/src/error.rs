//! Access-layer error types.

use thiserror::Error;

/// Result type for grant-store operations.
pub type AccessResult<T> = Result<T, AccessError>;

/// Errors raised by grant persistence. Policy decisions themselves never fail.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt grant row: {0}")]
    Corrupt(String),
}
