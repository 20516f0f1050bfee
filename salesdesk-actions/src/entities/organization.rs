//! Companies being prospected or served.

use crate::crud::{OwnedCrud, OwnedEntity};
use crate::entity::{EntityFilters, EntityKind, search_clause};
use crate::error::ActionResult;
use crate::validation::{MAX_NAME_LEN, MAX_TEXT_LEN, Validate, ValidationErrors};
use salesdesk_storage::FieldClause;
use salesdesk_types::{EntityType, Principal, RecordId, UserId};
use serde::{Deserialize, Serialize};

/// Headcount band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanySize {
    Micro,
    Small,
    Medium,
    Large,
    Enterprise,
}

impl CompanySize {
    pub fn as_str(self) -> &'static str {
        match self {
            CompanySize::Micro => "micro",
            CompanySize::Small => "small",
            CompanySize::Medium => "medium",
            CompanySize::Large => "large",
            CompanySize::Enterprise => "enterprise",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: RecordId,
    pub owner_id: UserId,
    pub name: String,
    pub domain: Option<String>,
    pub industry: Option<String>,
    pub size: Option<CompanySize>,
    pub employee_count: Option<u32>,
    pub annual_revenue: Option<f64>,
    pub website: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    /// Technologies the company runs, from the tech option catalog.
    #[serde(default)]
    pub tech_option_ids: Vec<RecordId>,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

owned_record!(Organization, EntityType::Organization);

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OrganizationInput {
    pub name: String,
    pub domain: Option<String>,
    pub industry: Option<String>,
    pub size: Option<CompanySize>,
    pub employee_count: Option<u32>,
    pub annual_revenue: Option<f64>,
    pub website: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub notes: Option<String>,
}

impl Validate for OrganizationInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.required_text("name", &self.name, MAX_NAME_LEN);
        errors.optional_text("domain", self.domain.as_deref(), MAX_NAME_LEN);
        errors.optional_text("industry", self.industry.as_deref(), MAX_NAME_LEN);
        errors.non_negative("annual_revenue", self.annual_revenue);
        errors.url("website", self.website.as_deref());
        errors.optional_text("notes", self.notes.as_deref(), MAX_TEXT_LEN);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OrganizationFilters {
    /// Matches name or domain.
    pub search: Option<String>,
    pub industry: Option<String>,
    pub size: Option<CompanySize>,
}

impl EntityFilters for OrganizationFilters {
    fn clauses(&self) -> Vec<FieldClause> {
        [
            search_clause(&["name", "domain"], self.search.as_deref()),
            self.industry
                .as_deref()
                .filter(|i| !i.trim().is_empty())
                .map(|i| FieldClause::eq("industry", i)),
            self.size.map(|s| FieldClause::eq("size", s.as_str())),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

impl EntityKind for Organization {
    const NOT_FOUND: &'static str = "Organização não encontrada";
    type Input = OrganizationInput;
    type Filters = OrganizationFilters;

    fn apply_input(&mut self, input: OrganizationInput, _now: i64) {
        self.name = input.name.trim().to_string();
        self.domain = input.domain.map(|d| d.trim().to_lowercase());
        self.industry = input.industry;
        self.size = input.size;
        self.employee_count = input.employee_count;
        self.annual_revenue = input.annual_revenue;
        self.website = input.website;
        self.city = input.city;
        self.state = input.state;
        self.country = input.country;
        self.notes = input.notes;
    }

    fn touch(&mut self, now: i64) {
        self.updated_at = now;
    }
}

impl OwnedEntity for Organization {
    fn from_input(id: RecordId, owner: UserId, input: OrganizationInput, now: i64) -> Self {
        let mut org = Organization {
            id,
            owner_id: owner,
            name: String::new(),
            domain: None,
            industry: None,
            size: None,
            employee_count: None,
            annual_revenue: None,
            website: None,
            city: None,
            state: None,
            country: None,
            tech_option_ids: Vec::new(),
            notes: None,
            created_at: now,
            updated_at: now,
        };
        org.apply_input(input, now);
        org
    }
}

pub type OrganizationActions = OwnedCrud<Organization>;

impl OwnedCrud<Organization> {
    /// Replace the technology profile. Duplicates are dropped, first
    /// occurrence wins.
    pub async fn update_tech_profile(
        &self,
        principal: Option<&Principal>,
        id: &RecordId,
        tech_option_ids: Vec<RecordId>,
    ) -> ActionResult<Organization> {
        self.mutate(principal, id, move |org, _| {
            let mut profile: Vec<RecordId> = Vec::with_capacity(tech_option_ids.len());
            for tech in tech_option_ids {
                if !profile.contains(&tech) {
                    profile.push(tech);
                }
            }
            org.tech_option_ids = profile;
            Ok(())
        })
        .await
    }
}
