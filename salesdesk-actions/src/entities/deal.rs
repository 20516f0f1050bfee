//! Deals moving through a sales pipeline.

use crate::crud::{OwnedCrud, OwnedEntity};
use crate::entity::{EntityFilters, EntityKind, id_clause, range_clause, search_clause};
use crate::error::ActionResult;
use crate::validation::{MAX_NAME_LEN, MAX_TEXT_LEN, REQUIRED, Validate, ValidationErrors};
use chrono::NaiveDate;
use salesdesk_storage::FieldClause;
use salesdesk_types::{EntityType, Principal, RecordId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_CURRENCY: &str = "BRL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DealStatus {
    #[default]
    Open,
    Won,
    Lost,
}

impl DealStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DealStatus::Open => "open",
            DealStatus::Won => "won",
            DealStatus::Lost => "lost",
        }
    }

    pub fn is_closed(self) -> bool {
        !matches!(self, DealStatus::Open)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub id: RecordId,
    pub owner_id: UserId,
    pub title: String,
    pub value: f64,
    pub currency: String,
    pub pipeline_id: Option<RecordId>,
    pub stage_id: Option<RecordId>,
    pub status: DealStatus,
    /// Win probability in percent.
    pub probability: Option<f64>,
    pub expected_close_date: Option<NaiveDate>,
    pub organization_id: Option<RecordId>,
    pub contact_id: Option<RecordId>,
    pub partner_id: Option<RecordId>,
    pub business_line_id: Option<RecordId>,
    #[serde(default)]
    pub product_ids: Vec<RecordId>,
    #[serde(default)]
    pub label_ids: Vec<RecordId>,
    pub notes: Option<String>,
    /// Set when the deal is won or lost, cleared when reopened.
    pub closed_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

owned_record!(Deal, EntityType::Deal);

impl Deal {
    /// Change the status, stamping or clearing `closed_at`.
    pub fn set_status(&mut self, status: DealStatus, now: i64) {
        if self.status == status {
            return;
        }
        self.status = status;
        self.closed_at = status.is_closed().then_some(now);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DealInput {
    pub title: String,
    pub value: f64,
    /// ISO 4217 code. Defaults to BRL.
    pub currency: Option<String>,
    pub pipeline_id: Option<RecordId>,
    pub stage_id: Option<RecordId>,
    pub probability: Option<f64>,
    pub expected_close_date: Option<NaiveDate>,
    pub organization_id: Option<RecordId>,
    pub contact_id: Option<RecordId>,
    pub partner_id: Option<RecordId>,
    pub business_line_id: Option<RecordId>,
    pub product_ids: Vec<RecordId>,
    pub label_ids: Vec<RecordId>,
    pub notes: Option<String>,
}

impl Validate for DealInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.required_text("title", &self.title, MAX_NAME_LEN);
        errors.non_negative("value", Some(self.value));
        errors.percentage("probability", self.probability);
        if let Some(currency) = &self.currency {
            if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
                errors.add("currency", "Moeda inválida");
            }
        }
        errors.optional_text("notes", self.notes.as_deref(), MAX_TEXT_LEN);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DealFilters {
    pub search: Option<String>,
    pub pipeline_id: Option<RecordId>,
    pub stage_id: Option<RecordId>,
    pub status: Option<DealStatus>,
    pub organization_id: Option<RecordId>,
    pub contact_id: Option<RecordId>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub close_from: Option<NaiveDate>,
    pub close_to: Option<NaiveDate>,
}

impl EntityFilters for DealFilters {
    fn clauses(&self) -> Vec<FieldClause> {
        let mut clauses: Vec<FieldClause> = [
            search_clause(&["title", "notes"], self.search.as_deref()),
            id_clause("pipeline_id", self.pipeline_id.as_ref()),
            id_clause("stage_id", self.stage_id.as_ref()),
            id_clause("organization_id", self.organization_id.as_ref()),
            id_clause("contact_id", self.contact_id.as_ref()),
            range_clause(
                "value",
                self.min_value.map(Value::from),
                self.max_value.map(Value::from),
            ),
            range_clause(
                "expected_close_date",
                self.close_from.map(|d| Value::from(d.to_string())),
                self.close_to.map(|d| Value::from(d.to_string())),
            ),
        ]
        .into_iter()
        .flatten()
        .collect();
        if let Some(status) = self.status {
            clauses.push(FieldClause::eq("status", status.as_str()));
        }
        clauses
    }
}

impl EntityKind for Deal {
    const NOT_FOUND: &'static str = "Negócio não encontrado";
    type Input = DealInput;
    type Filters = DealFilters;

    fn apply_input(&mut self, input: DealInput, _now: i64) {
        self.title = input.title.trim().to_string();
        self.value = input.value;
        self.currency = input.currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
        self.pipeline_id = input.pipeline_id;
        self.stage_id = input.stage_id;
        self.probability = input.probability;
        self.expected_close_date = input.expected_close_date;
        self.organization_id = input.organization_id;
        self.contact_id = input.contact_id;
        self.partner_id = input.partner_id;
        self.business_line_id = input.business_line_id;
        self.product_ids = input.product_ids;
        self.label_ids = input.label_ids;
        self.notes = input.notes;
    }

    fn touch(&mut self, now: i64) {
        self.updated_at = now;
    }
}

impl OwnedEntity for Deal {
    fn from_input(id: RecordId, owner: UserId, input: DealInput, now: i64) -> Self {
        let mut deal = Deal {
            id,
            owner_id: owner,
            title: String::new(),
            value: 0.0,
            currency: DEFAULT_CURRENCY.to_string(),
            pipeline_id: None,
            stage_id: None,
            status: DealStatus::Open,
            probability: None,
            expected_close_date: None,
            organization_id: None,
            contact_id: None,
            partner_id: None,
            business_line_id: None,
            product_ids: Vec::new(),
            label_ids: Vec::new(),
            notes: None,
            closed_at: None,
            created_at: now,
            updated_at: now,
        };
        deal.apply_input(input, now);
        deal
    }
}

pub type DealActions = OwnedCrud<Deal>;

impl OwnedCrud<Deal> {
    /// Move a deal to another stage (kanban drag).
    pub async fn update_stage(
        &self,
        principal: Option<&Principal>,
        id: &RecordId,
        stage_id: RecordId,
    ) -> ActionResult<Deal> {
        self.mutate(principal, id, move |deal, _| {
            if stage_id.as_str().trim().is_empty() {
                return Err(ValidationErrors::single("stage_id", REQUIRED));
            }
            deal.stage_id = Some(stage_id);
            Ok(())
        })
        .await
    }

    pub async fn update_status(
        &self,
        principal: Option<&Principal>,
        id: &RecordId,
        status: DealStatus,
    ) -> ActionResult<Deal> {
        self.mutate(principal, id, move |deal, now| {
            deal.set_status(status, now);
            Ok(())
        })
        .await
    }
}
