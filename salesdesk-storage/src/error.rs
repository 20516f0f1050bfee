//! Storage error types.

use salesdesk_types::{EntityType, RecordId};
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while reading or writing records.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{entity_type} {id} already exists")]
    Duplicate { entity_type: EntityType, id: RecordId },

    #[error("{entity_type} {id} does not exist")]
    Missing { entity_type: EntityType, id: RecordId },

    #[error("corrupt row {id}: {reason}")]
    Corrupt { id: String, reason: String },
}
