//! Leads: prospects not yet qualified into deals.

use crate::crud::{OwnedCrud, OwnedEntity};
use crate::entity::{EntityFilters, EntityKind, id_clause, search_clause};
use crate::error::ActionResult;
use crate::validation::{MAX_NAME_LEN, MAX_TEXT_LEN, Validate, ValidationErrors};
use salesdesk_storage::FieldClause;
use salesdesk_types::{EntityType, Principal, RecordId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Qualified,
    Disqualified,
    Converted,
}

impl LeadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Disqualified => "disqualified",
            LeadStatus::Converted => "converted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    Inbound,
    Outbound,
    Referral,
    Event,
    Partner,
    #[default]
    Other,
}

impl LeadSource {
    pub fn as_str(self) -> &'static str {
        match self {
            LeadSource::Inbound => "inbound",
            LeadSource::Outbound => "outbound",
            LeadSource::Referral => "referral",
            LeadSource::Event => "event",
            LeadSource::Partner => "partner",
            LeadSource::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: RecordId,
    pub owner_id: UserId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub source: LeadSource,
    pub status: LeadStatus,
    /// Ideal customer profile the lead was matched against.
    pub icp_id: Option<RecordId>,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

owned_record!(Lead, EntityType::Lead);

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LeadInput {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub source: LeadSource,
    pub icp_id: Option<RecordId>,
    pub notes: Option<String>,
}

impl Validate for LeadInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.required_text("name", &self.name, MAX_NAME_LEN);
        errors.email("email", self.email.as_deref());
        errors.optional_text("phone", self.phone.as_deref(), 40);
        errors.optional_text("company", self.company.as_deref(), MAX_NAME_LEN);
        errors.optional_text("job_title", self.job_title.as_deref(), MAX_NAME_LEN);
        errors.optional_text("notes", self.notes.as_deref(), MAX_TEXT_LEN);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LeadFilters {
    pub search: Option<String>,
    pub status: Option<LeadStatus>,
    pub source: Option<LeadSource>,
    pub icp_id: Option<RecordId>,
}

impl EntityFilters for LeadFilters {
    fn clauses(&self) -> Vec<FieldClause> {
        [
            search_clause(&["name", "email", "company"], self.search.as_deref()),
            self.status.map(|s| FieldClause::eq("status", s.as_str())),
            self.source.map(|s| FieldClause::eq("source", s.as_str())),
            id_clause("icp_id", self.icp_id.as_ref()),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

impl EntityKind for Lead {
    const NOT_FOUND: &'static str = "Lead não encontrado";
    type Input = LeadInput;
    type Filters = LeadFilters;

    fn apply_input(&mut self, input: LeadInput, _now: i64) {
        self.name = input.name.trim().to_string();
        self.email = input.email.filter(|e| !e.trim().is_empty());
        self.phone = input.phone;
        self.company = input.company;
        self.job_title = input.job_title;
        self.source = input.source;
        self.icp_id = input.icp_id;
        self.notes = input.notes;
    }

    fn touch(&mut self, now: i64) {
        self.updated_at = now;
    }
}

impl OwnedEntity for Lead {
    fn from_input(id: RecordId, owner: UserId, input: LeadInput, now: i64) -> Self {
        let mut lead = Lead {
            id,
            owner_id: owner,
            name: String::new(),
            email: None,
            phone: None,
            company: None,
            job_title: None,
            source: LeadSource::default(),
            status: LeadStatus::New,
            icp_id: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        lead.apply_input(input, now);
        lead
    }
}

pub type LeadActions = OwnedCrud<Lead>;

impl OwnedCrud<Lead> {
    pub async fn update_status(
        &self,
        principal: Option<&Principal>,
        id: &RecordId,
        status: LeadStatus,
    ) -> ActionResult<Lead> {
        self.mutate(principal, id, move |lead, _| {
            lead.status = status;
            Ok(())
        })
        .await
    }
}
