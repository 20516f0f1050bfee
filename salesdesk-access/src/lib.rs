//! Row-level access control for SalesDesk.
//!
//! - `policy` holds the pure decisions: which ownership scope a listing runs
//!   under, and whether a principal may mutate or read a given record
//! - `grants` holds explicit per-record sharing grants, consulted as a
//!   secondary read path beyond ownership
//!
//! Every entity's actions go through the same functions here, so the
//! visibility rule cannot drift between entities.

mod error;
pub mod grant_store;
pub mod grants;
pub mod policy;

pub use error::{AccessError, AccessResult};
pub use grant_store::SqliteGrantStore;
pub use grants::{GrantStore, MemoryGrantStore, ShareGrant};
pub use policy::{
    AccessPolicy, OwnerSelector, compute_list_filter, is_admin, may_mutate, owner_lookup_scope,
    role,
};
