#![allow(dead_code)]

use async_trait::async_trait;
use salesdesk_access::AccessPolicy;
use salesdesk_actions::{CatalogCrud, CatalogEntity, OwnedCrud, OwnedEntity, Principal, Role};
use salesdesk_storage::{
    MemoryRepository, Page, Record, RecordFilter, Repository, Sort, StorageResult,
};
use salesdesk_types::RecordId;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn alice() -> Principal {
    Principal::new("user-a", Role::Sdr)
}

pub fn bob() -> Principal {
    Principal::new("user-b", Role::Sdr)
}

pub fn carol() -> Principal {
    Principal::new("user-c", Role::Closer)
}

pub fn admin() -> Principal {
    Principal::admin("admin-1")
}

/// Memory repository that counts every call it receives.
pub struct CountingRepository<E: Record> {
    inner: MemoryRepository<E>,
    reads: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
}

impl<E: Record> Clone for CountingRepository<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            reads: self.reads.clone(),
            writes: self.writes.clone(),
        }
    }
}

impl<E: Record> CountingRepository<E> {
    pub fn new() -> Self {
        Self {
            inner: MemoryRepository::new(),
            reads: Arc::new(AtomicUsize::new(0)),
            writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.reads() + self.writes()
    }

    fn read(&self) {
        self.reads.fetch_add(1, Ordering::SeqCst);
    }

    fn write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl<E: Record> Repository<E> for CountingRepository<E> {
    async fn find_many(
        &self,
        filter: &RecordFilter,
        sort: &Sort,
        page: Option<Page>,
    ) -> StorageResult<Vec<E>> {
        self.read();
        self.inner.find_many(filter, sort, page).await
    }

    async fn find_one(&self, filter: &RecordFilter) -> StorageResult<Option<E>> {
        self.read();
        self.inner.find_one(filter).await
    }

    async fn create(&self, record: E) -> StorageResult<E> {
        self.write();
        self.inner.create(record).await
    }

    async fn update(&self, record: E) -> StorageResult<E> {
        self.write();
        self.inner.update(record).await
    }

    async fn delete(&self, id: &RecordId) -> StorageResult<bool> {
        self.write();
        self.inner.delete(id).await
    }

    async fn count(&self, filter: &RecordFilter) -> StorageResult<usize> {
        self.read();
        self.inner.count(filter).await
    }
}

/// Owned actions over a counting repository and a fresh grant store.
pub fn counted<E: OwnedEntity>() -> (OwnedCrud<E>, CountingRepository<E>) {
    counted_with(AccessPolicy::in_memory())
}

pub fn counted_with<E: OwnedEntity>(policy: AccessPolicy) -> (OwnedCrud<E>, CountingRepository<E>) {
    let repo = CountingRepository::<E>::new();
    (OwnedCrud::new(Arc::new(repo.clone()), policy), repo)
}

pub fn counted_catalog<E: CatalogEntity>() -> (CatalogCrud<E>, CountingRepository<E>) {
    let repo = CountingRepository::<E>::new();
    (CatalogCrud::new(Arc::new(repo.clone())), repo)
}
