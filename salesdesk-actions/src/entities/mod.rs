//! Concrete CRM entities.
//!
//! Owned entities run through [`OwnedCrud`](crate::OwnedCrud); the reference
//! catalog runs through [`CatalogCrud`](crate::CatalogCrud).

macro_rules! owned_record {
    ($ty:ty, $kind:expr) => {
        impl salesdesk_storage::Record for $ty {
            const ENTITY_TYPE: salesdesk_types::EntityType = $kind;

            fn id(&self) -> &salesdesk_types::RecordId {
                &self.id
            }

            fn owner_id(&self) -> Option<&salesdesk_types::UserId> {
                Some(&self.owner_id)
            }

            fn created_at(&self) -> i64 {
                self.created_at
            }

            fn updated_at(&self) -> i64 {
                self.updated_at
            }
        }
    };
}

macro_rules! reference_record {
    ($ty:ty, $kind:expr) => {
        impl salesdesk_storage::Record for $ty {
            const ENTITY_TYPE: salesdesk_types::EntityType = $kind;

            fn id(&self) -> &salesdesk_types::RecordId {
                &self.id
            }

            fn created_at(&self) -> i64 {
                self.created_at
            }

            fn updated_at(&self) -> i64 {
                self.updated_at
            }
        }
    };
}

pub mod activity;
pub mod contact;
pub mod deal;
pub mod icp;
pub mod lead;
pub mod organization;
pub mod partner;
pub mod reference;

pub use activity::{Activity, ActivityFilters, ActivityInput, ActivityKind};
pub use contact::{Contact, ContactFilters, ContactInput};
pub use deal::{Deal, DealFilters, DealInput, DealStatus};
pub use icp::{Icp, IcpFilters, IcpInput};
pub use lead::{Lead, LeadFilters, LeadInput, LeadSource, LeadStatus};
pub use organization::{CompanySize, Organization, OrganizationFilters, OrganizationInput};
pub use partner::{Partner, PartnerFilters, PartnerInput, PartnerType};
pub use reference::{
    BusinessLine, BusinessLineInput, Label, LabelInput, Pipeline, PipelineInput, Product,
    ProductFilters, ProductInput, Stage, StageFilters, StageInput, TechOption, TechOptionFilters,
    TechOptionInput,
};
