//! Owner-scoped CRUD actions for the SalesDesk CRM.
//!
//! Every action takes the already-resolved principal (`Option<&Principal>`)
//! and applies the access policy before touching a repository.
//!
//! # Architecture
//!
//! - [`OwnedCrud`] is the single implementation of list / get / create /
//!   update / delete / mutate / share for owned entities; each entity module
//!   instantiates it and adds its own single-field mutators
//! - [`CatalogCrud`] covers the ownerless reference catalog
//! - [`SalesDesk`] wires every entity to one repository source and one grant
//!   store, in memory or on disk
//!
//! Errors reaching the caller are `Unauthorized`, the entity's localized
//! `NotFound`, or `Validation` with field paths. Persistence failures pass
//! through opaquely.

pub mod catalog;
mod config;
pub mod crud;
pub mod entities;
mod entity;
mod error;
mod logging;
mod services;
pub mod validation;

pub use catalog::{CatalogCrud, CatalogEntity};
pub use config::{PagingLimits, SalesDeskConfig};
pub use crud::{ListQuery, OwnedCrud, OwnedEntity};
pub use entity::{EntityFilters, EntityKind, parse_input, require_principal};
pub use error::{ActionError, ActionResult};
pub use logging::init_tracing;
pub use services::SalesDesk;
pub use validation::{FieldError, Validate, ValidationErrors};

pub use salesdesk_access::{OwnerSelector, ShareGrant};
pub use salesdesk_storage::{Page, Sort};
pub use salesdesk_types::{EntityType, Principal, RecordId, Role, UserId};
