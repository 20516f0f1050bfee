//! Shared-record grants: explicit, per-record read access for another user.
//!
//! A grant is keyed by `(entity_type, entity_id, shared_with)`. Granting an
//! existing key and revoking a missing one are both no-ops. Record deletion
//! purges grants as cleanup only; a grant on a missing record is a harmless
//! orphan.

use crate::error::AccessResult;
use async_trait::async_trait;
use salesdesk_types::{EntityType, RecordId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// One sharing grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareGrant {
    pub entity_type: EntityType,
    pub entity_id: RecordId,
    pub shared_with: UserId,
    pub granted_by: UserId,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
}

/// Persistence for sharing grants.
#[async_trait]
pub trait GrantStore: Send + Sync {
    /// Record a grant. Returns `false` if the identical grant already existed,
    /// in which case the stored grant is left untouched.
    async fn grant(
        &self,
        entity_type: EntityType,
        entity_id: &RecordId,
        shared_with: &UserId,
        granted_by: &UserId,
    ) -> AccessResult<bool>;

    /// Remove a grant. Returns `false` if there was nothing to remove.
    async fn revoke(
        &self,
        entity_type: EntityType,
        entity_id: &RecordId,
        shared_with: &UserId,
    ) -> AccessResult<bool>;

    async fn is_granted(
        &self,
        entity_type: EntityType,
        entity_id: &RecordId,
        user: &UserId,
    ) -> AccessResult<bool>;

    /// Every grant made to `user`, oldest first.
    async fn list_grants_for(&self, user: &UserId) -> AccessResult<Vec<ShareGrant>>;

    /// Every grant on one record, oldest first.
    async fn list_grants_on(
        &self,
        entity_type: EntityType,
        entity_id: &RecordId,
    ) -> AccessResult<Vec<ShareGrant>>;

    /// Drop all grants on one record. Returns how many were removed.
    async fn purge_record(&self, entity_type: EntityType, entity_id: &RecordId)
        -> AccessResult<usize>;
}

type GrantKey = (EntityType, RecordId, UserId);

/// In-process grant store.
#[derive(Clone, Default)]
pub struct MemoryGrantStore {
    grants: Arc<RwLock<HashMap<GrantKey, ShareGrant>>>,
}

impl MemoryGrantStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.grants.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.grants.read().await.is_empty()
    }
}

fn oldest_first(mut grants: Vec<ShareGrant>) -> Vec<ShareGrant> {
    grants.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.entity_id.cmp(&b.entity_id))
            .then_with(|| a.shared_with.cmp(&b.shared_with))
    });
    grants
}

#[async_trait]
impl GrantStore for MemoryGrantStore {
    async fn grant(
        &self,
        entity_type: EntityType,
        entity_id: &RecordId,
        shared_with: &UserId,
        granted_by: &UserId,
    ) -> AccessResult<bool> {
        let key = (entity_type, entity_id.clone(), shared_with.clone());
        let mut grants = self.grants.write().await;
        if grants.contains_key(&key) {
            return Ok(false);
        }
        grants.insert(
            key,
            ShareGrant {
                entity_type,
                entity_id: entity_id.clone(),
                shared_with: shared_with.clone(),
                granted_by: granted_by.clone(),
                created_at: chrono::Utc::now().timestamp_millis(),
            },
        );
        Ok(true)
    }

    async fn revoke(
        &self,
        entity_type: EntityType,
        entity_id: &RecordId,
        shared_with: &UserId,
    ) -> AccessResult<bool> {
        let key = (entity_type, entity_id.clone(), shared_with.clone());
        Ok(self.grants.write().await.remove(&key).is_some())
    }

    async fn is_granted(
        &self,
        entity_type: EntityType,
        entity_id: &RecordId,
        user: &UserId,
    ) -> AccessResult<bool> {
        let key = (entity_type, entity_id.clone(), user.clone());
        Ok(self.grants.read().await.contains_key(&key))
    }

    async fn list_grants_for(&self, user: &UserId) -> AccessResult<Vec<ShareGrant>> {
        let grants = self.grants.read().await;
        Ok(oldest_first(
            grants
                .values()
                .filter(|g| &g.shared_with == user)
                .cloned()
                .collect(),
        ))
    }

    async fn list_grants_on(
        &self,
        entity_type: EntityType,
        entity_id: &RecordId,
    ) -> AccessResult<Vec<ShareGrant>> {
        let grants = self.grants.read().await;
        Ok(oldest_first(
            grants
                .values()
                .filter(|g| g.entity_type == entity_type && &g.entity_id == entity_id)
                .cloned()
                .collect(),
        ))
    }

    async fn purge_record(
        &self,
        entity_type: EntityType,
        entity_id: &RecordId,
    ) -> AccessResult<usize> {
        let mut grants = self.grants.write().await;
        let before = grants.len();
        grants.retain(|(t, id, _), _| !(*t == entity_type && id == entity_id));
        Ok(before - grants.len())
    }
}
