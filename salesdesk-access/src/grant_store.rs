//! SQLite-backed grant persistence.
//!
//! The primary key on `(entity_type, entity_id, shared_with)` together with
//! `INSERT OR IGNORE` is what makes granting idempotent.

use crate::error::{AccessError, AccessResult};
use crate::grants::{GrantStore, ShareGrant};
use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};
use salesdesk_types::{EntityType, RecordId, UserId};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

/// Persistent grant store.
#[derive(Clone)]
pub struct SqliteGrantStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteGrantStore {
    /// Opens or creates a grant database at the given path.
    pub fn open(path: &Path) -> AccessResult<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        initialize_grant_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory grant database (for testing).
    pub fn open_in_memory() -> AccessResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_grant_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("SqliteGrantStore recovering from poisoned mutex");
            poisoned.into_inner()
        })
    }

    /// Total number of stored grants.
    pub fn grant_count(&self) -> AccessResult<usize> {
        let conn = self.lock_conn();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM shared_grants", [], |r| r.get(0))?;
        Ok(count as usize)
    }

    fn query_grants(&self, sql: &str, args: &[&str]) -> AccessResult<Vec<ShareGrant>> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare(sql)?;
        let rows: Vec<(String, String, String, String, i64)> = stmt
            .query_map(rusqlite::params_from_iter(args.iter()), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            })?
            .collect::<Result<_, _>>()?;

        rows.into_iter()
            .map(|(entity_type, entity_id, shared_with, granted_by, created_at)| {
                let entity_type = entity_type
                    .parse::<EntityType>()
                    .map_err(|e| AccessError::Corrupt(e.to_string()))?;
                Ok(ShareGrant {
                    entity_type,
                    entity_id: RecordId(entity_id),
                    shared_with: UserId(shared_with),
                    granted_by: UserId(granted_by),
                    created_at,
                })
            })
            .collect()
    }
}

#[async_trait]
impl GrantStore for SqliteGrantStore {
    async fn grant(
        &self,
        entity_type: EntityType,
        entity_id: &RecordId,
        shared_with: &UserId,
        granted_by: &UserId,
    ) -> AccessResult<bool> {
        let now = chrono::Utc::now().timestamp_millis();
        let conn = self.lock_conn();
        let inserted = conn.execute(
            r#"
            INSERT OR IGNORE INTO shared_grants (entity_type, entity_id, shared_with, granted_by, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                entity_type.as_str(),
                entity_id.as_str(),
                shared_with.as_str(),
                granted_by.as_str(),
                now,
            ],
        )?;
        if inserted > 0 {
            info!(entity = %entity_type, id = %entity_id, shared_with = %shared_with, "grant persisted");
        }
        Ok(inserted > 0)
    }

    async fn revoke(
        &self,
        entity_type: EntityType,
        entity_id: &RecordId,
        shared_with: &UserId,
    ) -> AccessResult<bool> {
        let conn = self.lock_conn();
        let removed = conn.execute(
            "DELETE FROM shared_grants WHERE entity_type = ?1 AND entity_id = ?2 AND shared_with = ?3",
            params![entity_type.as_str(), entity_id.as_str(), shared_with.as_str()],
        )?;
        Ok(removed > 0)
    }

    async fn is_granted(
        &self,
        entity_type: EntityType,
        entity_id: &RecordId,
        user: &UserId,
    ) -> AccessResult<bool> {
        let conn = self.lock_conn();
        let found = conn
            .query_row(
                "SELECT 1 FROM shared_grants WHERE entity_type = ?1 AND entity_id = ?2 AND shared_with = ?3",
                params![entity_type.as_str(), entity_id.as_str(), user.as_str()],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    async fn list_grants_for(&self, user: &UserId) -> AccessResult<Vec<ShareGrant>> {
        self.query_grants(
            "SELECT entity_type, entity_id, shared_with, granted_by, created_at FROM shared_grants \
             WHERE shared_with = ?1 ORDER BY created_at, entity_id, shared_with",
            &[user.as_str()],
        )
    }

    async fn list_grants_on(
        &self,
        entity_type: EntityType,
        entity_id: &RecordId,
    ) -> AccessResult<Vec<ShareGrant>> {
        self.query_grants(
            "SELECT entity_type, entity_id, shared_with, granted_by, created_at FROM shared_grants \
             WHERE entity_type = ?1 AND entity_id = ?2 ORDER BY created_at, entity_id, shared_with",
            &[entity_type.as_str(), entity_id.as_str()],
        )
    }

    async fn purge_record(
        &self,
        entity_type: EntityType,
        entity_id: &RecordId,
    ) -> AccessResult<usize> {
        let conn = self.lock_conn();
        let removed = conn.execute(
            "DELETE FROM shared_grants WHERE entity_type = ?1 AND entity_id = ?2",
            params![entity_type.as_str(), entity_id.as_str()],
        )?;
        Ok(removed)
    }
}

fn initialize_grant_schema(conn: &Connection) -> AccessResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS shared_grants (
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            shared_with TEXT NOT NULL,
            granted_by TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            PRIMARY KEY (entity_type, entity_id, shared_with)
        );
        CREATE INDEX IF NOT EXISTS idx_shared_grants_user ON shared_grants(shared_with);
        "#,
    )?;
    Ok(())
}
