//! Owner-scoped CRUD, generic over the entity.
//!
//! Every owned entity runs through [`OwnedCrud`], so the ownership rules are
//! written exactly once:
//!
//! - no principal: `Unauthorized`, before any repository call
//! - listings: scoped by [`compute_list_filter`]; non-admins only ever see
//!   their own rows
//! - lookups by id: owner-scoped for non-admins, and a miss is `None`
//! - mutations: plain fetch by id, then owner-or-admin check; a foreign
//!   record fails with the same `NotFound` as a missing one
//! - creation: the owner is always the calling principal
//!
//! Sharing grants only widen reads ([`OwnedCrud::get_accessible`],
//! [`OwnedCrud::list_shared_with_me`]). They never authorize a mutation.

use crate::config::PagingLimits;
use crate::entity::{EntityFilters, EntityKind, now_millis, parse_input, require_principal};
use crate::error::{ActionError, ActionResult};
use crate::validation::{Validate, ValidationErrors};
use salesdesk_access::{
    AccessPolicy, OwnerSelector, ShareGrant, compute_list_filter, may_mutate, owner_lookup_scope,
};
use salesdesk_storage::{Page, RecordFilter, Repository, Sort};
use salesdesk_types::{Principal, RecordId, UserId};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// An entity with a per-row owner.
pub trait OwnedEntity: EntityKind {
    /// Build a new record. `owner` is the creating principal, never a value
    /// taken from the input.
    fn from_input(id: RecordId, owner: UserId, input: Self::Input, now: i64) -> Self;
}

/// Listing arguments: owner selection, entity filters, ordering and window.
#[derive(Debug, Clone, Default)]
pub struct ListQuery<F> {
    pub owner: Option<OwnerSelector>,
    pub filters: F,
    pub sort: Option<Sort>,
    pub page: Option<Page>,
}

impl<F: Default> ListQuery<F> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<F> ListQuery<F> {
    pub fn filtered(filters: F) -> Self {
        Self {
            owner: None,
            filters,
            sort: None,
            page: None,
        }
    }

    pub fn owner(mut self, owner: OwnerSelector) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Owner selection straight from a request parameter.
    pub fn owner_param(mut self, raw: Option<&str>) -> Self {
        self.owner = OwnerSelector::parse(raw);
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn page(mut self, page: Page) -> Self {
        self.page = Some(page);
        self
    }
}

/// Owner-scoped actions for one entity type.
#[derive(Clone)]
pub struct OwnedCrud<E: OwnedEntity> {
    repo: Arc<dyn Repository<E>>,
    policy: AccessPolicy,
    paging: PagingLimits,
}

impl<E: OwnedEntity> OwnedCrud<E> {
    pub fn new(repo: Arc<dyn Repository<E>>, policy: AccessPolicy) -> Self {
        Self {
            repo,
            policy,
            paging: PagingLimits::default(),
        }
    }

    pub fn with_paging(mut self, paging: PagingLimits) -> Self {
        self.paging = paging;
        self
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    fn list_filter(&self, principal: &Principal, query: &ListQuery<E::Filters>) -> RecordFilter {
        let scope = compute_list_filter(principal, query.owner.as_ref());
        RecordFilter::scoped(scope).with_clauses(query.filters.clauses())
    }

    /// Records visible to the caller, in the entity's default order unless
    /// the query overrides it.
    pub async fn list(
        &self,
        principal: Option<&Principal>,
        query: &ListQuery<E::Filters>,
    ) -> ActionResult<Vec<E>> {
        let principal = require_principal(principal)?;
        let filter = self.list_filter(principal, query);
        let sort = query.sort.clone().unwrap_or_else(E::default_sort);
        let page = self.paging.resolve(query.page);
        Ok(self.repo.find_many(&filter, &sort, Some(page)).await?)
    }

    /// Number of records `list` would return without paging.
    pub async fn count(
        &self,
        principal: Option<&Principal>,
        query: &ListQuery<E::Filters>,
    ) -> ActionResult<usize> {
        let principal = require_principal(principal)?;
        let filter = self.list_filter(principal, query);
        Ok(self.repo.count(&filter).await?)
    }

    /// Single record by id. A missing record and someone else's record both
    /// come back as `None`.
    pub async fn get_by_id(
        &self,
        principal: Option<&Principal>,
        id: &RecordId,
    ) -> ActionResult<Option<E>> {
        let principal = require_principal(principal)?;
        let filter = RecordFilter::scoped(owner_lookup_scope(principal)).with_id(id.clone());
        let found = self.repo.find_one(&filter).await?;
        if found.is_none() {
            debug!(entity = %E::ENTITY_TYPE, id = %id, user = %principal.user_id, "lookup missed");
        }
        Ok(found)
    }

    /// Single record by id for its owner, an admin, or a grantee.
    pub async fn get_accessible(
        &self,
        principal: Option<&Principal>,
        id: &RecordId,
    ) -> ActionResult<Option<E>> {
        let principal = require_principal(principal)?;
        let Some(record) = self.repo.find_by_id(id).await? else {
            return Ok(None);
        };
        if self.policy.can_access_record(principal, &record).await? {
            Ok(Some(record))
        } else {
            Ok(None)
        }
    }

    /// Records other users shared with the caller, oldest grant first.
    /// Orphaned grants and the caller's own records are skipped.
    pub async fn list_shared_with_me(&self, principal: Option<&Principal>) -> ActionResult<Vec<E>> {
        let principal = require_principal(principal)?;
        let grants = self.policy.grants().list_grants_for(&principal.user_id).await?;
        let mut shared = Vec::new();
        for grant in grants.iter().filter(|g| g.entity_type == E::ENTITY_TYPE) {
            match self.repo.find_by_id(&grant.entity_id).await? {
                Some(record) if !principal.owns(record.owner_id()) => shared.push(record),
                Some(_) => {}
                None => debug!(entity = %E::ENTITY_TYPE, id = %grant.entity_id, "orphaned grant"),
            }
        }
        Ok(shared)
    }

    pub async fn create(&self, principal: Option<&Principal>, input: E::Input) -> ActionResult<E> {
        let principal = require_principal(principal)?;
        input.validate()?;
        let record = E::from_input(RecordId::new(), principal.user_id.clone(), input, now_millis());
        let created = self.repo.create(record).await?;
        info!(entity = %E::ENTITY_TYPE, id = %created.id(), owner = %principal.user_id, "record created");
        Ok(created)
    }

    /// `create` from an untyped JSON payload.
    pub async fn create_json(
        &self,
        principal: Option<&Principal>,
        raw: serde_json::Value,
    ) -> ActionResult<E> {
        require_principal(principal)?;
        let input: E::Input = parse_input(raw)?;
        self.create(principal, input).await
    }

    /// Plain fetch by id, then owner-or-admin. Both failures are the same
    /// `NotFound`.
    async fn load_for_mutation(&self, principal: &Principal, id: &RecordId) -> ActionResult<E> {
        let Some(record) = self.repo.find_by_id(id).await? else {
            debug!(entity = %E::ENTITY_TYPE, id = %id, "mutation target missing");
            return Err(ActionError::NotFound(E::NOT_FOUND));
        };
        if !may_mutate(principal, record.owner_id()) {
            debug!(
                entity = %E::ENTITY_TYPE,
                id = %id,
                user = %principal.user_id,
                "mutation target not owned by caller"
            );
            return Err(ActionError::NotFound(E::NOT_FOUND));
        }
        Ok(record)
    }

    pub async fn update(
        &self,
        principal: Option<&Principal>,
        id: &RecordId,
        input: E::Input,
    ) -> ActionResult<E> {
        let principal = require_principal(principal)?;
        let record = self.load_for_mutation(principal, id).await?;
        self.replace_fields(principal, record, input).await
    }

    /// `update` from an untyped JSON payload. The payload is decoded only
    /// after the ownership check.
    pub async fn update_json(
        &self,
        principal: Option<&Principal>,
        id: &RecordId,
        raw: serde_json::Value,
    ) -> ActionResult<E> {
        let principal = require_principal(principal)?;
        let record = self.load_for_mutation(principal, id).await?;
        let input: E::Input = parse_input(raw)?;
        self.replace_fields(principal, record, input).await
    }

    async fn replace_fields(
        &self,
        principal: &Principal,
        mut record: E,
        input: E::Input,
    ) -> ActionResult<E> {
        input.validate()?;
        let now = now_millis();
        record.apply_input(input, now);
        record.touch(now);
        let updated = self.repo.update(record).await?;
        info!(entity = %E::ENTITY_TYPE, id = %updated.id(), user = %principal.user_id, "record updated");
        Ok(updated)
    }

    /// Delete a record and drop any grants on it.
    pub async fn delete(&self, principal: Option<&Principal>, id: &RecordId) -> ActionResult<()> {
        let principal = require_principal(principal)?;
        self.load_for_mutation(principal, id).await?;
        if !self.repo.delete(id).await? {
            return Err(ActionError::NotFound(E::NOT_FOUND));
        }
        info!(entity = %E::ENTITY_TYPE, id = %id, user = %principal.user_id, "record deleted");
        if let Err(e) = self.policy.grants().purge_record(E::ENTITY_TYPE, id).await {
            warn!(entity = %E::ENTITY_TYPE, id = %id, error = %e, "failed to purge grants");
        }
        Ok(())
    }

    /// Single-field mutation under the same rules as `update`. `change`
    /// receives the record and the current time in milliseconds.
    pub async fn mutate<F>(
        &self,
        principal: Option<&Principal>,
        id: &RecordId,
        change: F,
    ) -> ActionResult<E>
    where
        F: FnOnce(&mut E, i64) -> Result<(), ValidationErrors> + Send,
    {
        let principal = require_principal(principal)?;
        let mut record = self.load_for_mutation(principal, id).await?;
        let now = now_millis();
        change(&mut record, now)?;
        record.touch(now);
        let updated = self.repo.update(record).await?;
        info!(entity = %E::ENTITY_TYPE, id = %id, user = %principal.user_id, "record mutated");
        Ok(updated)
    }

    /// Give `user` read access to one record. Only the owner or an admin may
    /// share. Returns `false` if the grant already existed.
    pub async fn share(
        &self,
        principal: Option<&Principal>,
        id: &RecordId,
        user: &UserId,
    ) -> ActionResult<bool> {
        let principal = require_principal(principal)?;
        let record = self.load_for_mutation(principal, id).await?;
        if &principal.user_id == user {
            return Err(ValidationErrors::single(
                "shared_with",
                "Não é possível compartilhar consigo mesmo",
            )
            .into());
        }
        if record.owner_id() == Some(user) {
            return Err(
                ValidationErrors::single("shared_with", "Usuário já é o responsável").into(),
            );
        }
        let created = self
            .policy
            .grants()
            .grant(E::ENTITY_TYPE, id, user, &principal.user_id)
            .await?;
        if created {
            info!(entity = %E::ENTITY_TYPE, id = %id, shared_with = %user, by = %principal.user_id, "record shared");
        }
        Ok(created)
    }

    /// Withdraw a grant. Returns `false` if there was none.
    pub async fn unshare(
        &self,
        principal: Option<&Principal>,
        id: &RecordId,
        user: &UserId,
    ) -> ActionResult<bool> {
        let principal = require_principal(principal)?;
        self.load_for_mutation(principal, id).await?;
        let removed = self.policy.grants().revoke(E::ENTITY_TYPE, id, user).await?;
        if removed {
            info!(entity = %E::ENTITY_TYPE, id = %id, shared_with = %user, by = %principal.user_id, "share revoked");
        }
        Ok(removed)
    }

    /// Grants on one record, visible to its owner or an admin.
    pub async fn list_shares(
        &self,
        principal: Option<&Principal>,
        id: &RecordId,
    ) -> ActionResult<Vec<ShareGrant>> {
        let principal = require_principal(principal)?;
        self.load_for_mutation(principal, id).await?;
        Ok(self.policy.grants().list_grants_on(E::ENTITY_TYPE, id).await?)
    }
}
