//! In-process repository, used by tests and by setups without a data dir.

use crate::error::{StorageError, StorageResult};
use crate::filter::{Page, RecordFilter, Sort};
use crate::record::Record;
use crate::repository::Repository;
use async_trait::async_trait;
use salesdesk_types::RecordId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Repository backed by a `HashMap` behind an async `RwLock`.
pub struct MemoryRepository<E: Record> {
    records: Arc<RwLock<HashMap<RecordId, E>>>,
}

impl<E: Record> MemoryRepository<E> {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of stored records, regardless of owner.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    async fn matching(&self, filter: &RecordFilter) -> StorageResult<Vec<(E, serde_json::Value)>> {
        let records = self.records.read().await;
        let mut out = Vec::new();
        for record in records.values() {
            let doc = serde_json::to_value(record)?;
            if filter.admits(record.id(), record.owner_id(), &doc) {
                out.push((record.clone(), doc));
            }
        }
        Ok(out)
    }
}

impl<E: Record> Default for MemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Record> Clone for MemoryRepository<E> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
        }
    }
}

#[async_trait]
impl<E: Record> Repository<E> for MemoryRepository<E> {
    async fn find_many(
        &self,
        filter: &RecordFilter,
        sort: &Sort,
        page: Option<Page>,
    ) -> StorageResult<Vec<E>> {
        let mut rows = self.matching(filter).await?;
        sort.apply(&mut rows, |r| r.id().as_str());
        let records: Vec<E> = rows.into_iter().map(|(r, _)| r).collect();
        Ok(match page {
            Some(page) => page.apply(records),
            None => records,
        })
    }

    async fn find_one(&self, filter: &RecordFilter) -> StorageResult<Option<E>> {
        if let Some(id) = &filter.id {
            let records = self.records.read().await;
            let Some(record) = records.get(id) else {
                return Ok(None);
            };
            let doc = serde_json::to_value(record)?;
            return Ok(filter
                .admits(record.id(), record.owner_id(), &doc)
                .then(|| record.clone()));
        }
        Ok(self.matching(filter).await?.into_iter().next().map(|(r, _)| r))
    }

    async fn create(&self, record: E) -> StorageResult<E> {
        let mut records = self.records.write().await;
        if records.contains_key(record.id()) {
            return Err(StorageError::Duplicate {
                entity_type: E::ENTITY_TYPE,
                id: record.id().clone(),
            });
        }
        records.insert(record.id().clone(), record.clone());
        Ok(record)
    }

    async fn update(&self, record: E) -> StorageResult<E> {
        let mut records = self.records.write().await;
        match records.get_mut(record.id()) {
            Some(slot) => {
                *slot = record.clone();
                Ok(record)
            }
            None => Err(StorageError::Missing {
                entity_type: E::ENTITY_TYPE,
                id: record.id().clone(),
            }),
        }
    }

    async fn delete(&self, id: &RecordId) -> StorageResult<bool> {
        Ok(self.records.write().await.remove(id).is_some())
    }

    async fn count(&self, filter: &RecordFilter) -> StorageResult<usize> {
        Ok(self.matching(filter).await?.len())
    }
}
