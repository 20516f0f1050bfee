//! Traits shared by owned and reference entities.

use crate::error::{ActionError, ActionResult};
use crate::validation::{Validate, ValidationErrors};
use salesdesk_storage::{FieldClause, Record, Sort};
use salesdesk_types::Principal;
use serde::de::DeserializeOwned;

/// Entity-specific listing filters, lowered to storage clauses.
pub trait EntityFilters {
    fn clauses(&self) -> Vec<FieldClause>;
}

impl EntityFilters for () {
    fn clauses(&self) -> Vec<FieldClause> {
        Vec::new()
    }
}

/// A record type the action layer can create and edit from caller input.
pub trait EntityKind: Record {
    /// Localized message for a missing (or foreign) record.
    const NOT_FOUND: &'static str;

    /// Caller payload for create and update. Unknown keys are ignored, so an
    /// `ownerId` smuggled into the payload never reaches the record.
    type Input: Validate + DeserializeOwned + Send + Sync + 'static;

    type Filters: EntityFilters + Default + Send + Sync + 'static;

    fn default_sort() -> Sort {
        Sort::desc("created_at")
    }

    /// Overwrite the editable fields from `input`.
    fn apply_input(&mut self, input: Self::Input, now: i64);

    /// Stamp a modification time.
    fn touch(&mut self, now: i64);
}

/// Fails with `Unauthorized` when no principal resolved.
pub fn require_principal(principal: Option<&Principal>) -> ActionResult<&Principal> {
    principal.ok_or(ActionError::Unauthorized)
}

/// Decode a raw JSON payload into an entity input.
pub fn parse_input<I: DeserializeOwned>(raw: serde_json::Value) -> Result<I, ValidationErrors> {
    serde_json::from_value(raw).map_err(|e| ValidationErrors::single("input", e.to_string()))
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Search clause that is dropped when the needle is blank.
pub(crate) fn search_clause(fields: &[&str], needle: Option<&str>) -> Option<FieldClause> {
    needle
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(|n| FieldClause::search(fields, n))
}

/// Equality clause on a reference id, when one was given.
pub(crate) fn id_clause(field: &str, id: Option<&salesdesk_types::RecordId>) -> Option<FieldClause> {
    id.map(|id| FieldClause::eq(field, id.as_str()))
}

/// Inclusive range clause, when at least one bound was given.
pub(crate) fn range_clause(
    field: &str,
    min: Option<serde_json::Value>,
    max: Option<serde_json::Value>,
) -> Option<FieldClause> {
    if min.is_none() && max.is_none() {
        None
    } else {
        Some(FieldClause::range(field, min, max))
    }
}
