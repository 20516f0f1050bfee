//! DuckDB record store. Every entity type lives in one `records` table.
//!
//! The ownership scope and id of a [`RecordFilter`] are pushed into SQL so
//! that foreign rows never leave the database. Field clauses are evaluated
//! against the decoded `data_json` afterwards.

use crate::error::{StorageError, StorageResult};
use crate::filter::{OwnerScope, Page, RecordFilter, Sort};
use crate::record::Record;
use crate::repository::Repository;
use async_trait::async_trait;
use duckdb::{Connection, params, params_from_iter};
use salesdesk_types::{EntityType, RecordId, UserId};
use std::marker::PhantomData;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// One row of the `records` table.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    pub id: RecordId,
    pub entity_type: EntityType,
    pub owner_id: Option<UserId>,
    pub data: serde_json::Value,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Untyped record store backed by DuckDB.
#[derive(Clone)]
pub struct RecordStore {
    conn: Arc<Mutex<Connection>>,
}

impl RecordStore {
    /// Opens or creates a record store at the given path.
    pub fn open(path: &Path, memory_limit: &str, threads: u32) -> StorageResult<Self> {
        let conn = crate::open_duckdb_with_wal_recovery(path, memory_limit, threads)?;
        initialize_records_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory record store (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_records_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Typed repository view over this store.
    pub fn repository<E: Record>(&self) -> DuckDbRepository<E> {
        DuckDbRepository {
            store: self.clone(),
            _marker: PhantomData,
        }
    }

    fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("RecordStore recovering from poisoned mutex");
            poisoned.into_inner()
        })
    }

    /// Insert a new row. Fails with `Duplicate` if the id already exists.
    pub fn insert_row(&self, row: &StoredRow) -> StorageResult<()> {
        let data_json = serde_json::to_string(&row.data)?;
        let conn = self.lock_conn();
        let exists: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM records WHERE id = ?",
            params![row.id.as_str()],
            |r| r.get(0),
        )?;
        if exists {
            return Err(StorageError::Duplicate {
                entity_type: row.entity_type,
                id: row.id.clone(),
            });
        }
        conn.execute(
            r#"
            INSERT INTO records (id, entity_type, owner_id, data_json, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                row.id.as_str(),
                row.entity_type.as_str(),
                row.owner_id.as_ref().map(UserId::as_str),
                data_json,
                row.created_at,
                row.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Replace the payload of an existing row. Returns the number of rows changed.
    ///
    /// `owner_id` is written once at insert and never touched here.
    pub fn update_row(&self, row: &StoredRow) -> StorageResult<usize> {
        let data_json = serde_json::to_string(&row.data)?;
        let conn = self.lock_conn();
        let changed = conn.execute(
            "UPDATE records SET data_json = ?, updated_at = ? WHERE id = ? AND entity_type = ?",
            params![
                data_json,
                row.updated_at,
                row.id.as_str(),
                row.entity_type.as_str(),
            ],
        )?;
        Ok(changed)
    }

    /// Delete a row. Returns whether it existed.
    pub fn delete_row(&self, entity_type: EntityType, id: &RecordId) -> StorageResult<bool> {
        let conn = self.lock_conn();
        let deleted = conn.execute(
            "DELETE FROM records WHERE id = ? AND entity_type = ?",
            params![id.as_str(), entity_type.as_str()],
        )?;
        Ok(deleted > 0)
    }

    /// Rows of one type restricted by ownership scope and optional id,
    /// newest first.
    pub fn select_rows(
        &self,
        entity_type: EntityType,
        owner: &OwnerScope,
        id: Option<&RecordId>,
    ) -> StorageResult<Vec<StoredRow>> {
        let mut sql = String::from(
            "SELECT id, owner_id, data_json, created_at, updated_at FROM records WHERE entity_type = ?",
        );
        let mut args: Vec<String> = vec![entity_type.as_str().to_string()];
        if let Some(owner) = owner.owner() {
            sql.push_str(" AND owner_id = ?");
            args.push(owner.as_str().to_string());
        }
        if let Some(id) = id {
            sql.push_str(" AND id = ?");
            args.push(id.as_str().to_string());
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let conn = self.lock_conn();
        let mut stmt = conn.prepare(&sql)?;
        let raw: Vec<(String, Option<String>, String, i64, i64)> = stmt
            .query_map(params_from_iter(args.iter()), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            })?
            .collect::<Result<_, _>>()?;

        drop(stmt);
        drop(conn);

        raw.into_iter()
            .map(|(id, owner_id, data_json, created_at, updated_at)| {
                let data = serde_json::from_str(&data_json).map_err(|e| StorageError::Corrupt {
                    id: id.clone(),
                    reason: e.to_string(),
                })?;
                Ok(StoredRow {
                    id: RecordId(id),
                    entity_type,
                    owner_id: owner_id.map(UserId),
                    data,
                    created_at,
                    updated_at,
                })
            })
            .collect()
    }

    /// Number of rows of one type, regardless of owner.
    pub fn count_rows(&self, entity_type: EntityType) -> StorageResult<usize> {
        let conn = self.lock_conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM records WHERE entity_type = ?",
            params![entity_type.as_str()],
            |r| r.get(0),
        )?;
        Ok(count as usize)
    }

    /// Flush the WAL into the database file.
    pub fn checkpoint(&self) -> StorageResult<()> {
        self.lock_conn().execute_batch("CHECKPOINT")?;
        Ok(())
    }
}

/// Typed [`Repository`] over a shared [`RecordStore`].
pub struct DuckDbRepository<E: Record> {
    store: RecordStore,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Record> Clone for DuckDbRepository<E> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _marker: PhantomData,
        }
    }
}

impl<E: Record> DuckDbRepository<E> {
    fn to_row(record: &E) -> StorageResult<StoredRow> {
        Ok(StoredRow {
            id: record.id().clone(),
            entity_type: E::ENTITY_TYPE,
            owner_id: record.owner_id().cloned(),
            data: serde_json::to_value(record)?,
            created_at: record.created_at(),
            updated_at: record.updated_at(),
        })
    }

    fn select(&self, filter: &RecordFilter) -> StorageResult<Vec<(E, serde_json::Value)>> {
        let rows = self
            .store
            .select_rows(E::ENTITY_TYPE, &filter.owner, filter.id.as_ref())?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            if !filter.admits(&row.id, row.owner_id.as_ref(), &row.data) {
                continue;
            }
            let record: E = serde_json::from_value(row.data.clone()).map_err(|e| {
                StorageError::Corrupt {
                    id: row.id.to_string(),
                    reason: e.to_string(),
                }
            })?;
            out.push((record, row.data));
        }
        Ok(out)
    }
}

#[async_trait]
impl<E: Record> Repository<E> for DuckDbRepository<E> {
    async fn find_many(
        &self,
        filter: &RecordFilter,
        sort: &Sort,
        page: Option<Page>,
    ) -> StorageResult<Vec<E>> {
        let mut rows = self.select(filter)?;
        sort.apply(&mut rows, |r| r.id().as_str());
        let records: Vec<E> = rows.into_iter().map(|(r, _)| r).collect();
        Ok(match page {
            Some(page) => page.apply(records),
            None => records,
        })
    }

    async fn find_one(&self, filter: &RecordFilter) -> StorageResult<Option<E>> {
        Ok(self.select(filter)?.into_iter().next().map(|(r, _)| r))
    }

    async fn create(&self, record: E) -> StorageResult<E> {
        self.store.insert_row(&Self::to_row(&record)?)?;
        Ok(record)
    }

    async fn update(&self, record: E) -> StorageResult<E> {
        let changed = self.store.update_row(&Self::to_row(&record)?)?;
        if changed == 0 {
            return Err(StorageError::Missing {
                entity_type: E::ENTITY_TYPE,
                id: record.id().clone(),
            });
        }
        Ok(record)
    }

    async fn delete(&self, id: &RecordId) -> StorageResult<bool> {
        self.store.delete_row(E::ENTITY_TYPE, id)
    }

    async fn count(&self, filter: &RecordFilter) -> StorageResult<usize> {
        if filter.id.is_none() && filter.clauses.is_empty() && filter.owner == OwnerScope::Unrestricted {
            return self.store.count_rows(E::ENTITY_TYPE);
        }
        Ok(self.select(filter)?.len())
    }
}

fn initialize_records_schema(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS records (
            id VARCHAR PRIMARY KEY,
            entity_type VARCHAR NOT NULL,
            owner_id VARCHAR,
            data_json TEXT NOT NULL,
            created_at BIGINT NOT NULL,
            updated_at BIGINT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_records_type_owner ON records(entity_type, owner_id);
        CREATE INDEX IF NOT EXISTS idx_records_created ON records(created_at DESC);
        "#,
    )?;
    Ok(())
}
