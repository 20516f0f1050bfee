//! Access policy deciding which records a principal may see or change.
//!
//! The listing rule is the load-bearing one: a non-admin's scope always
//! collapses to their own records, whatever owner selector the request
//! carried. Admins choose freely between everyone, themselves, or one user.

use crate::error::AccessResult;
use crate::grants::{GrantStore, MemoryGrantStore};
use salesdesk_storage::{OwnerScope, Record};
use salesdesk_types::{Principal, Role, UserId};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Owner selection requested by the caller of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OwnerSelector {
    /// Every owner (`"all"`).
    All,
    /// The requesting principal (`"mine"`).
    Mine,
    /// One specific user.
    User(UserId),
}

impl OwnerSelector {
    /// Parse the raw request value. Absent or blank means no selection.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        let raw = raw?.trim();
        if raw.is_empty() {
            return None;
        }
        Some(match raw {
            "all" => OwnerSelector::All,
            "mine" => OwnerSelector::Mine,
            user => OwnerSelector::User(UserId::new(user)),
        })
    }
}

impl FromStr for OwnerSelector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(OwnerSelector::parse(Some(s)).unwrap_or(OwnerSelector::All))
    }
}

impl fmt::Display for OwnerSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerSelector::All => f.write_str("all"),
            OwnerSelector::Mine => f.write_str("mine"),
            OwnerSelector::User(user) => write!(f, "{user}"),
        }
    }
}

/// Ownership scope a listing runs under.
pub fn compute_list_filter(principal: &Principal, requested: Option<&OwnerSelector>) -> OwnerScope {
    if !principal.is_admin() {
        return OwnerScope::Owner(principal.user_id.clone());
    }
    match requested {
        None | Some(OwnerSelector::All) => OwnerScope::Unrestricted,
        Some(OwnerSelector::Mine) => OwnerScope::Owner(principal.user_id.clone()),
        Some(OwnerSelector::User(user)) => OwnerScope::Owner(user.clone()),
    }
}

/// Ownership scope for a single-record lookup by id.
pub fn owner_lookup_scope(principal: &Principal) -> OwnerScope {
    if principal.is_admin() {
        OwnerScope::Unrestricted
    } else {
        OwnerScope::Owner(principal.user_id.clone())
    }
}

/// Whether `principal` may change or delete a record owned by `owner`.
///
/// Sharing grants are deliberately not consulted: they are read-only.
pub fn may_mutate(principal: &Principal, owner: Option<&UserId>) -> bool {
    principal.is_admin() || principal.owns(owner)
}

pub fn is_admin(principal: &Principal) -> bool {
    principal.is_admin()
}

pub fn role(principal: &Principal) -> Role {
    principal.role()
}

/// Policy decisions that need the grant store.
#[derive(Clone)]
pub struct AccessPolicy {
    grants: Arc<dyn GrantStore>,
}

impl AccessPolicy {
    pub fn new(grants: Arc<dyn GrantStore>) -> Self {
        Self { grants }
    }

    /// Policy over an empty in-memory grant store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryGrantStore::new()))
    }

    pub fn grants(&self) -> &Arc<dyn GrantStore> {
        &self.grants
    }

    /// Owner-or-shared read check.
    ///
    /// Admins and owners always pass; anyone else needs an explicit grant on
    /// this record. Records without ownership (reference catalog) are visible
    /// to every authenticated principal.
    pub async fn can_access_record<R: Record>(
        &self,
        principal: &Principal,
        record: &R,
    ) -> AccessResult<bool> {
        if principal.is_admin() || !R::ENTITY_TYPE.is_owned() {
            return Ok(true);
        }
        if principal.owns(record.owner_id()) {
            return Ok(true);
        }
        let granted = self
            .grants
            .is_granted(R::ENTITY_TYPE, record.id(), &principal.user_id)
            .await?;
        if !granted {
            debug!(
                entity = %R::ENTITY_TYPE,
                id = %record.id(),
                user = %principal.user_id,
                "record neither owned nor shared"
            );
        }
        Ok(granted)
    }

    pub fn is_admin(&self, principal: &Principal) -> bool {
        is_admin(principal)
    }

    pub fn role(&self, principal: &Principal) -> Role {
        role(principal)
    }
}

impl fmt::Debug for AccessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessPolicy").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sdr(id: &str) -> Principal {
        Principal::new(id, Role::Sdr)
    }

    #[test]
    fn selector_parsing() {
        assert_eq!(OwnerSelector::parse(None), None);
        assert_eq!(OwnerSelector::parse(Some("  ")), None);
        assert_eq!(OwnerSelector::parse(Some("all")), Some(OwnerSelector::All));
        assert_eq!(OwnerSelector::parse(Some("mine")), Some(OwnerSelector::Mine));
        assert_eq!(
            OwnerSelector::parse(Some("user-7")),
            Some(OwnerSelector::User(UserId::new("user-7")))
        );
        assert_eq!("user-7".parse::<OwnerSelector>().unwrap().to_string(), "user-7");
    }

    #[test]
    fn lookup_scope_follows_role() {
        assert_eq!(owner_lookup_scope(&Principal::admin("root")), OwnerScope::Unrestricted);
        assert_eq!(
            owner_lookup_scope(&sdr("a")),
            OwnerScope::Owner(UserId::new("a"))
        );
    }

    #[test]
    fn mutation_requires_owner_or_admin() {
        let a = UserId::new("a");
        assert!(may_mutate(&sdr("a"), Some(&a)));
        assert!(!may_mutate(&sdr("b"), Some(&a)));
        assert!(!may_mutate(&Principal::new("b", Role::Closer), Some(&a)));
        assert!(may_mutate(&Principal::admin("root"), Some(&a)));
        assert!(!may_mutate(&sdr("a"), None));
    }

    #[test]
    fn accessors_agree_with_role() {
        let closer = Principal::new("c", Role::Closer);
        assert!(!is_admin(&closer));
        assert_eq!(role(&closer), Role::Closer);
        assert!(is_admin(&Principal::admin("root")));
    }
}
