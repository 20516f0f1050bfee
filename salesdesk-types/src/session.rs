//! Boundary to the external authentication collaborator.
//!
//! The web layer resolves a principal once per request and then passes it
//! explicitly into every action; nothing in SalesDesk reads a global session.

use crate::principal::Principal;

/// Source of the current authenticated principal, if any.
pub trait SessionResolver: Send + Sync {
    fn current_principal(&self) -> Option<Principal>;
}

impl SessionResolver for Option<Principal> {
    fn current_principal(&self) -> Option<Principal> {
        self.clone()
    }
}

impl SessionResolver for Principal {
    fn current_principal(&self) -> Option<Principal> {
        Some(self.clone())
    }
}

/// A resolver with a fixed answer. Useful for background jobs and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSession(pub Option<Principal>);

impl StaticSession {
    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn signed_in(principal: Principal) -> Self {
        Self(Some(principal))
    }
}

impl SessionResolver for StaticSession {
    fn current_principal(&self) -> Option<Principal> {
        self.0.clone()
    }
}
