//! The service bundle: every entity's actions over one pair of stores.

use crate::catalog::{CatalogCrud, CatalogEntity};
use crate::config::{PagingLimits, SalesDeskConfig};
use crate::crud::{OwnedCrud, OwnedEntity};
use crate::entities::activity::ActivityActions;
use crate::entities::contact::ContactActions;
use crate::entities::deal::DealActions;
use crate::entities::icp::IcpActions;
use crate::entities::lead::LeadActions;
use crate::entities::organization::OrganizationActions;
use crate::entities::partner::PartnerActions;
use crate::entities::reference::{
    BusinessLineActions, LabelActions, PipelineActions, ProductActions, StageActions,
    TechOptionActions,
};
use crate::error::ActionResult;
use salesdesk_access::{AccessPolicy, SqliteGrantStore};
use salesdesk_storage::{MemoryRepository, Record, RecordStore, Repository};
use std::sync::Arc;
use tracing::info;

/// Where typed repositories come from.
trait RepositorySource {
    fn repository<E: Record>(&self) -> Arc<dyn Repository<E>>;
}

struct InMemory;

impl RepositorySource for InMemory {
    fn repository<E: Record>(&self) -> Arc<dyn Repository<E>> {
        Arc::new(MemoryRepository::<E>::new())
    }
}

impl RepositorySource for RecordStore {
    fn repository<E: Record>(&self) -> Arc<dyn Repository<E>> {
        Arc::new(RecordStore::repository::<E>(self))
    }
}

fn owned<E: OwnedEntity>(
    source: &impl RepositorySource,
    policy: &AccessPolicy,
    paging: PagingLimits,
) -> OwnedCrud<E> {
    OwnedCrud::new(source.repository::<E>(), policy.clone()).with_paging(paging)
}

fn catalog<E: CatalogEntity>(source: &impl RepositorySource, paging: PagingLimits) -> CatalogCrud<E> {
    CatalogCrud::new(source.repository::<E>()).with_paging(paging)
}

/// All SalesDesk actions sharing one access policy.
#[derive(Clone)]
pub struct SalesDesk {
    pub deals: DealActions,
    pub contacts: ContactActions,
    pub leads: LeadActions,
    pub organizations: OrganizationActions,
    pub partners: PartnerActions,
    pub activities: ActivityActions,
    pub icps: IcpActions,

    pub pipelines: PipelineActions,
    pub stages: StageActions,
    pub products: ProductActions,
    pub business_lines: BusinessLineActions,
    pub labels: LabelActions,
    pub tech_options: TechOptionActions,

    policy: AccessPolicy,
    records: Option<RecordStore>,
}

impl SalesDesk {
    /// Everything in memory with default paging.
    pub fn in_memory() -> Self {
        Self::assemble(&InMemory, AccessPolicy::in_memory(), PagingLimits::default(), None)
    }

    /// Open the stores described by `config`. Without a `data_dir` this is
    /// [`SalesDesk::in_memory`] with the configured paging.
    pub fn open(config: &SalesDeskConfig) -> ActionResult<Self> {
        config.validate()?;
        let paging = config.paging();
        let (Some(dir), Some(records_path), Some(grants_path)) =
            (&config.data_dir, config.records_path(), config.grants_path())
        else {
            return Ok(Self::assemble(&InMemory, AccessPolicy::in_memory(), paging, None));
        };

        std::fs::create_dir_all(dir)?;
        let store = RecordStore::open(
            &records_path,
            &config.duckdb_memory_limit,
            config.duckdb_threads,
        )?;
        let grants = SqliteGrantStore::open(&grants_path)?;
        info!(data_dir = %dir.display(), "SalesDesk stores opened");

        let policy = AccessPolicy::new(Arc::new(grants));
        Ok(Self::assemble(&store, policy, paging, Some(store.clone())))
    }

    fn assemble(
        source: &impl RepositorySource,
        policy: AccessPolicy,
        paging: PagingLimits,
        records: Option<RecordStore>,
    ) -> Self {
        Self {
            deals: owned(source, &policy, paging),
            contacts: owned(source, &policy, paging),
            leads: owned(source, &policy, paging),
            organizations: owned(source, &policy, paging),
            partners: owned(source, &policy, paging),
            activities: owned(source, &policy, paging),
            icps: owned(source, &policy, paging),
            pipelines: catalog(source, paging),
            stages: catalog(source, paging),
            products: catalog(source, paging),
            business_lines: catalog(source, paging),
            labels: catalog(source, paging),
            tech_options: catalog(source, paging),
            policy,
            records,
        }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub fn is_persistent(&self) -> bool {
        self.records.is_some()
    }

    /// Flush the record store to disk. No-op in memory.
    pub fn checkpoint(&self) -> ActionResult<()> {
        if let Some(records) = &self.records {
            records.checkpoint()?;
        }
        Ok(())
    }
}
