//! Shared identifiers and the authenticated principal for SalesDesk.
//!
//! Everything here is plain data: the access policy, the repositories and
//! the CRUD actions all agree on these types so that an ownership check in
//! one entity module means exactly the same thing in every other.

mod entity_type;
mod ids;
mod principal;
mod session;

pub use entity_type::EntityType;
pub use ids::{RecordId, UserId};
pub use principal::{Principal, Role};
pub use session::{SessionResolver, StaticSession};

use thiserror::Error;

/// Errors raised when parsing wire values into core types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("unknown entity type: {0}")]
    UnknownEntityType(String),
}
