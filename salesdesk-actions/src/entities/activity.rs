//! Calls, meetings, tasks and other follow-ups.

use crate::crud::{OwnedCrud, OwnedEntity};
use crate::entity::{EntityFilters, EntityKind, id_clause, range_clause, search_clause};
use crate::error::ActionResult;
use crate::validation::{MAX_NAME_LEN, MAX_TEXT_LEN, Validate, ValidationErrors};
use chrono::{DateTime, Utc};
use salesdesk_storage::{FieldClause, Sort};
use salesdesk_types::{EntityType, Principal, RecordId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Call,
    Meeting,
    Email,
    #[default]
    Task,
    Note,
    Whatsapp,
}

impl ActivityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityKind::Call => "call",
            ActivityKind::Meeting => "meeting",
            ActivityKind::Email => "email",
            ActivityKind::Task => "task",
            ActivityKind::Note => "note",
            ActivityKind::Whatsapp => "whatsapp",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: RecordId,
    pub owner_id: UserId,
    pub kind: ActivityKind,
    pub subject: String,
    pub description: Option<String>,
    /// Stored as milliseconds since the Unix epoch.
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub due_at: Option<DateTime<Utc>>,
    pub completed: bool,
    pub completed_at: Option<i64>,
    pub deal_id: Option<RecordId>,
    pub contact_id: Option<RecordId>,
    pub lead_id: Option<RecordId>,
    pub partner_id: Option<RecordId>,
    pub organization_id: Option<RecordId>,
    pub created_at: i64,
    pub updated_at: i64,
}

owned_record!(Activity, EntityType::Activity);

impl Activity {
    pub fn set_completed(&mut self, completed: bool, now: i64) {
        self.completed = completed;
        self.completed_at = completed.then_some(now);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ActivityInput {
    pub kind: ActivityKind,
    pub subject: String,
    pub description: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub due_at: Option<DateTime<Utc>>,
    pub deal_id: Option<RecordId>,
    pub contact_id: Option<RecordId>,
    pub lead_id: Option<RecordId>,
    pub partner_id: Option<RecordId>,
    pub organization_id: Option<RecordId>,
}

impl Validate for ActivityInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.required_text("subject", &self.subject, MAX_NAME_LEN);
        errors.optional_text("description", self.description.as_deref(), MAX_TEXT_LEN);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ActivityFilters {
    pub search: Option<String>,
    pub kind: Option<ActivityKind>,
    pub completed: Option<bool>,
    pub deal_id: Option<RecordId>,
    pub contact_id: Option<RecordId>,
    pub lead_id: Option<RecordId>,
    pub partner_id: Option<RecordId>,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub due_from: Option<DateTime<Utc>>,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub due_to: Option<DateTime<Utc>>,
}

impl EntityFilters for ActivityFilters {
    fn clauses(&self) -> Vec<FieldClause> {
        [
            search_clause(&["subject", "description"], self.search.as_deref()),
            self.kind.map(|k| FieldClause::eq("kind", k.as_str())),
            self.completed.map(|c| FieldClause::eq("completed", c)),
            id_clause("deal_id", self.deal_id.as_ref()),
            id_clause("contact_id", self.contact_id.as_ref()),
            id_clause("lead_id", self.lead_id.as_ref()),
            id_clause("partner_id", self.partner_id.as_ref()),
            range_clause(
                "due_at",
                self.due_from.map(|d| Value::from(d.timestamp_millis())),
                self.due_to.map(|d| Value::from(d.timestamp_millis())),
            ),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

impl EntityKind for Activity {
    const NOT_FOUND: &'static str = "Atividade não encontrada";
    type Input = ActivityInput;
    type Filters = ActivityFilters;

    /// Soonest due first; undated activities last.
    fn default_sort() -> Sort {
        Sort::asc("due_at")
    }

    fn apply_input(&mut self, input: ActivityInput, _now: i64) {
        self.kind = input.kind;
        self.subject = input.subject.trim().to_string();
        self.description = input.description;
        self.due_at = input.due_at;
        self.deal_id = input.deal_id;
        self.contact_id = input.contact_id;
        self.lead_id = input.lead_id;
        self.partner_id = input.partner_id;
        self.organization_id = input.organization_id;
    }

    fn touch(&mut self, now: i64) {
        self.updated_at = now;
    }
}

impl OwnedEntity for Activity {
    fn from_input(id: RecordId, owner: UserId, input: ActivityInput, now: i64) -> Self {
        let mut activity = Activity {
            id,
            owner_id: owner,
            kind: ActivityKind::default(),
            subject: String::new(),
            description: None,
            due_at: None,
            completed: false,
            completed_at: None,
            deal_id: None,
            contact_id: None,
            lead_id: None,
            partner_id: None,
            organization_id: None,
            created_at: now,
            updated_at: now,
        };
        activity.apply_input(input, now);
        activity
    }
}

pub type ActivityActions = OwnedCrud<Activity>;

impl OwnedCrud<Activity> {
    pub async fn toggle_completed(
        &self,
        principal: Option<&Principal>,
        id: &RecordId,
    ) -> ActionResult<Activity> {
        self.mutate(principal, id, |activity, now| {
            let completed = !activity.completed;
            activity.set_completed(completed, now);
            Ok(())
        })
        .await
    }

    /// Reschedule, or clear the due date with `None`.
    pub async fn update_due_date(
        &self,
        principal: Option<&Principal>,
        id: &RecordId,
        due_at: Option<DateTime<Utc>>,
    ) -> ActionResult<Activity> {
        self.mutate(principal, id, move |activity, _| {
            activity.due_at = due_at;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn due_at_round_trips_as_millis() {
        let input: ActivityInput = serde_json::from_value(json!({
            "subject": "Ligar para Ana",
            "kind": "call",
            "due_at": 1_767_225_600_000i64
        }))
        .unwrap();
        let activity = Activity::from_input(RecordId::from("a1"), UserId::new("u"), input, 1);
        let doc = serde_json::to_value(&activity).unwrap();
        assert_eq!(doc["due_at"], json!(1_767_225_600_000i64));
        assert_eq!(doc["kind"], json!("call"));
    }

    #[test]
    fn completion_stamps_time() {
        let mut activity = Activity::from_input(
            RecordId::from("a1"),
            UserId::new("u"),
            ActivityInput {
                subject: "Follow-up".into(),
                ..ActivityInput::default()
            },
            1,
        );
        activity.set_completed(true, 50);
        assert_eq!(activity.completed_at, Some(50));
        activity.set_completed(false, 60);
        assert_eq!(activity.completed_at, None);
    }
}
