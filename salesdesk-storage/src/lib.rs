//! Persistence boundary for SalesDesk.
//!
//! Defines the generic repository contract every entity is stored through,
//! the structural filter language the access policy composes into, and two
//! implementations of the contract.
//!
//! # Architecture
//!
//! - `Record` describes how a typed entity maps onto a stored row
//! - `RecordFilter` is an AND-combination of an ownership scope, an optional
//!   id and entity-specific field clauses
//! - `MemoryRepository` keeps records in process (tests, ephemeral setups)
//! - `RecordStore` keeps every entity type in one DuckDB `records` table;
//!   `DuckDbRepository` is a typed view over it
//!
//! Repositories never decide ownership: they persist exactly what they are
//! given and honor the filters they are handed.

mod error;
mod filter;
mod memory;
mod record;
mod record_store;
mod repository;

pub use error::{StorageError, StorageResult};
pub use filter::{FieldClause, OwnerScope, Page, RecordFilter, Sort, SortDirection};
pub use memory::MemoryRepository;
pub use record::Record;
pub use record_store::{DuckDbRepository, RecordStore, StoredRow};
pub use repository::Repository;

/// Open a DuckDB connection with stale WAL recovery and resource limits.
///
/// If the initial open fails and a `.wal` file exists alongside the database,
/// it is removed and the open is retried once. An unclean shutdown can leave
/// a WAL file behind that prevents reopening.
pub fn open_duckdb_with_wal_recovery(
    path: &std::path::Path,
    memory_limit: &str,
    threads: u32,
) -> StorageResult<duckdb::Connection> {
    let conn = match duckdb::Connection::open(path) {
        Ok(c) => c,
        Err(first_err) => {
            let wal_path = path.with_extension(
                path.extension()
                    .map(|ext| format!("{}.wal", ext.to_string_lossy()))
                    .unwrap_or_else(|| "wal".to_string()),
            );
            if !wal_path.exists() {
                return Err(first_err.into());
            }
            tracing::warn!(
                wal = %wal_path.display(),
                "DuckDB open failed, removing stale WAL and retrying"
            );
            std::fs::remove_file(&wal_path)?;
            duckdb::Connection::open(path)?
        }
    };
    apply_resource_limits(&conn, memory_limit, threads)?;
    Ok(conn)
}

/// Apply memory and thread limits to a DuckDB connection.
fn apply_resource_limits(
    conn: &duckdb::Connection,
    memory_limit: &str,
    threads: u32,
) -> StorageResult<()> {
    conn.execute_batch(&format!(
        "PRAGMA memory_limit='{}'; PRAGMA threads={};",
        memory_limit.replace('\'', "''"),
        threads
    ))?;
    Ok(())
}
