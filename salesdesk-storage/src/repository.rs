use crate::error::StorageResult;
use crate::filter::{Page, RecordFilter, Sort};
use crate::record::Record;
use async_trait::async_trait;
use salesdesk_types::RecordId;

/// Persistence contract for one entity type.
///
/// Implementations must honor every part of a [`RecordFilter`]; the access
/// layer relies on the ownership scope being applied exactly.
#[async_trait]
pub trait Repository<E: Record>: Send + Sync {
    /// Records matching `filter`, ordered by `sort`, optionally windowed.
    async fn find_many(
        &self,
        filter: &RecordFilter,
        sort: &Sort,
        page: Option<Page>,
    ) -> StorageResult<Vec<E>>;

    /// First record matching `filter`, if any.
    async fn find_one(&self, filter: &RecordFilter) -> StorageResult<Option<E>>;

    /// Plain lookup by id with no ownership restriction.
    async fn find_by_id(&self, id: &RecordId) -> StorageResult<Option<E>> {
        self.find_one(&RecordFilter::by_id(id.clone())).await
    }

    /// Insert a new record. Fails with `Duplicate` if the id is taken.
    async fn create(&self, record: E) -> StorageResult<E>;

    /// Replace an existing record. Fails with `Missing` if the id is unknown.
    async fn update(&self, record: E) -> StorageResult<E>;

    /// Remove a record. Returns whether anything was removed.
    async fn delete(&self, id: &RecordId) -> StorageResult<bool>;

    /// Number of records matching `filter`.
    async fn count(&self, filter: &RecordFilter) -> StorageResult<usize>;
}
