//! Channel partners that refer or resell deals.

use crate::crud::{OwnedCrud, OwnedEntity};
use crate::entity::{EntityFilters, EntityKind, search_clause};
use crate::error::ActionResult;
use crate::validation::{MAX_NAME_LEN, MAX_TEXT_LEN, Validate, ValidationErrors};
use salesdesk_storage::FieldClause;
use salesdesk_types::{EntityType, Principal, RecordId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartnerType {
    #[default]
    Referral,
    Reseller,
    Technology,
    Consulting,
}

impl PartnerType {
    pub fn as_str(self) -> &'static str {
        match self {
            PartnerType::Referral => "referral",
            PartnerType::Reseller => "reseller",
            PartnerType::Technology => "technology",
            PartnerType::Consulting => "consulting",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partner {
    pub id: RecordId,
    pub owner_id: UserId,
    pub name: String,
    pub partner_type: PartnerType,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    /// Commission in percent.
    pub commission_rate: Option<f64>,
    pub active: bool,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

owned_record!(Partner, EntityType::Partner);

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PartnerInput {
    pub name: String,
    pub partner_type: PartnerType,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub commission_rate: Option<f64>,
    pub notes: Option<String>,
}

impl Validate for PartnerInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.required_text("name", &self.name, MAX_NAME_LEN);
        errors.email("email", self.email.as_deref());
        errors.url("website", self.website.as_deref());
        errors.percentage("commission_rate", self.commission_rate);
        errors.optional_text("notes", self.notes.as_deref(), MAX_TEXT_LEN);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PartnerFilters {
    pub search: Option<String>,
    pub partner_type: Option<PartnerType>,
    pub active: Option<bool>,
}

impl EntityFilters for PartnerFilters {
    fn clauses(&self) -> Vec<FieldClause> {
        [
            search_clause(&["name", "email"], self.search.as_deref()),
            self.partner_type
                .map(|t| FieldClause::eq("partner_type", t.as_str())),
            self.active.map(|a| FieldClause::eq("active", a)),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

impl EntityKind for Partner {
    const NOT_FOUND: &'static str = "Parceiro não encontrado";
    type Input = PartnerInput;
    type Filters = PartnerFilters;

    fn apply_input(&mut self, input: PartnerInput, _now: i64) {
        self.name = input.name.trim().to_string();
        self.partner_type = input.partner_type;
        self.email = input.email;
        self.phone = input.phone;
        self.website = input.website;
        self.commission_rate = input.commission_rate;
        self.notes = input.notes;
    }

    fn touch(&mut self, now: i64) {
        self.updated_at = now;
    }
}

impl OwnedEntity for Partner {
    fn from_input(id: RecordId, owner: UserId, input: PartnerInput, now: i64) -> Self {
        let mut partner = Partner {
            id,
            owner_id: owner,
            name: String::new(),
            partner_type: PartnerType::default(),
            email: None,
            phone: None,
            website: None,
            commission_rate: None,
            active: true,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        partner.apply_input(input, now);
        partner
    }
}

pub type PartnerActions = OwnedCrud<Partner>;

impl OwnedCrud<Partner> {
    pub async fn toggle_active(
        &self,
        principal: Option<&Principal>,
        id: &RecordId,
    ) -> ActionResult<Partner> {
        self.mutate(principal, id, |partner, _| {
            partner.active = !partner.active;
            Ok(())
        })
        .await
    }
}
