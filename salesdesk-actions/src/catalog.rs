//! CRUD for the reference catalog.
//!
//! Reference entities carry no owner. Any authenticated principal may read
//! and write them; restricting writes to admins is left to the presentation
//! layer.

use crate::config::PagingLimits;
use crate::crud::ListQuery;
use crate::entity::{EntityFilters, EntityKind, now_millis, parse_input, require_principal};
use crate::error::{ActionError, ActionResult};
use crate::validation::Validate;
use salesdesk_storage::{RecordFilter, Repository};
use salesdesk_types::{Principal, RecordId};
use std::sync::Arc;
use tracing::info;

/// An entity without a per-row owner.
pub trait CatalogEntity: EntityKind {
    fn from_input(id: RecordId, input: Self::Input, now: i64) -> Self;
}

/// Actions for one reference entity type.
#[derive(Clone)]
pub struct CatalogCrud<E: CatalogEntity> {
    repo: Arc<dyn Repository<E>>,
    paging: PagingLimits,
}

impl<E: CatalogEntity> CatalogCrud<E> {
    pub fn new(repo: Arc<dyn Repository<E>>) -> Self {
        Self {
            repo,
            paging: PagingLimits::default(),
        }
    }

    pub fn with_paging(mut self, paging: PagingLimits) -> Self {
        self.paging = paging;
        self
    }

    pub(crate) fn repository(&self) -> &Arc<dyn Repository<E>> {
        &self.repo
    }

    /// The query's owner selection is ignored.
    pub async fn list(
        &self,
        principal: Option<&Principal>,
        query: &ListQuery<E::Filters>,
    ) -> ActionResult<Vec<E>> {
        require_principal(principal)?;
        let filter = RecordFilter::all().with_clauses(query.filters.clauses());
        let sort = query.sort.clone().unwrap_or_else(E::default_sort);
        let page = self.paging.resolve(query.page);
        Ok(self.repo.find_many(&filter, &sort, Some(page)).await?)
    }

    pub async fn get_by_id(
        &self,
        principal: Option<&Principal>,
        id: &RecordId,
    ) -> ActionResult<Option<E>> {
        require_principal(principal)?;
        Ok(self.repo.find_by_id(id).await?)
    }

    pub async fn create(&self, principal: Option<&Principal>, input: E::Input) -> ActionResult<E> {
        let principal = require_principal(principal)?;
        input.validate()?;
        let created = self
            .repo
            .create(E::from_input(RecordId::new(), input, now_millis()))
            .await?;
        info!(entity = %E::ENTITY_TYPE, id = %created.id(), user = %principal.user_id, "catalog entry created");
        Ok(created)
    }

    pub async fn create_json(
        &self,
        principal: Option<&Principal>,
        raw: serde_json::Value,
    ) -> ActionResult<E> {
        require_principal(principal)?;
        let input: E::Input = parse_input(raw)?;
        self.create(principal, input).await
    }

    pub async fn update(
        &self,
        principal: Option<&Principal>,
        id: &RecordId,
        input: E::Input,
    ) -> ActionResult<E> {
        let principal = require_principal(principal)?;
        let Some(mut entry) = self.repo.find_by_id(id).await? else {
            return Err(ActionError::NotFound(E::NOT_FOUND));
        };
        input.validate()?;
        let now = now_millis();
        entry.apply_input(input, now);
        entry.touch(now);
        let updated = self.repo.update(entry).await?;
        info!(entity = %E::ENTITY_TYPE, id = %id, user = %principal.user_id, "catalog entry updated");
        Ok(updated)
    }

    pub async fn delete(&self, principal: Option<&Principal>, id: &RecordId) -> ActionResult<()> {
        let principal = require_principal(principal)?;
        if !self.repo.delete(id).await? {
            return Err(ActionError::NotFound(E::NOT_FOUND));
        }
        info!(entity = %E::ENTITY_TYPE, id = %id, user = %principal.user_id, "catalog entry deleted");
        Ok(())
    }
}
