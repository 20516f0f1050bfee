//! Ideal customer profiles used to qualify leads.

use crate::crud::{OwnedCrud, OwnedEntity};
use crate::entity::{EntityFilters, EntityKind, search_clause};
use crate::entities::organization::CompanySize;
use crate::validation::{MAX_NAME_LEN, MAX_TEXT_LEN, Validate, ValidationErrors};
use salesdesk_storage::FieldClause;
use salesdesk_types::{EntityType, RecordId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Icp {
    pub id: RecordId,
    pub owner_id: UserId,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub industries: Vec<String>,
    #[serde(default)]
    pub company_sizes: Vec<CompanySize>,
    pub min_employees: Option<u32>,
    pub max_employees: Option<u32>,
    pub min_revenue: Option<f64>,
    pub max_revenue: Option<f64>,
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub pain_points: Vec<String>,
    #[serde(default)]
    pub tech_option_ids: Vec<RecordId>,
    pub created_at: i64,
    pub updated_at: i64,
}

owned_record!(Icp, EntityType::Icp);

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct IcpInput {
    pub name: String,
    pub description: Option<String>,
    pub industries: Vec<String>,
    pub company_sizes: Vec<CompanySize>,
    pub min_employees: Option<u32>,
    pub max_employees: Option<u32>,
    pub min_revenue: Option<f64>,
    pub max_revenue: Option<f64>,
    pub regions: Vec<String>,
    pub pain_points: Vec<String>,
    pub tech_option_ids: Vec<RecordId>,
}

impl Validate for IcpInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.required_text("name", &self.name, MAX_NAME_LEN);
        errors.optional_text("description", self.description.as_deref(), MAX_TEXT_LEN);
        errors.ordered("max_employees", self.min_employees, self.max_employees);
        errors.non_negative("min_revenue", self.min_revenue);
        errors.non_negative("max_revenue", self.max_revenue);
        errors.ordered("max_revenue", self.min_revenue, self.max_revenue);
        for (i, pain) in self.pain_points.iter().enumerate() {
            errors.optional_text(&format!("pain_points[{i}]"), Some(pain.as_str()), MAX_NAME_LEN);
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct IcpFilters {
    pub search: Option<String>,
}

impl EntityFilters for IcpFilters {
    fn clauses(&self) -> Vec<FieldClause> {
        search_clause(&["name", "description"], self.search.as_deref())
            .into_iter()
            .collect()
    }
}

impl EntityKind for Icp {
    const NOT_FOUND: &'static str = "ICP não encontrado";
    type Input = IcpInput;
    type Filters = IcpFilters;

    fn apply_input(&mut self, input: IcpInput, _now: i64) {
        self.name = input.name.trim().to_string();
        self.description = input.description;
        self.industries = input.industries;
        self.company_sizes = input.company_sizes;
        self.min_employees = input.min_employees;
        self.max_employees = input.max_employees;
        self.min_revenue = input.min_revenue;
        self.max_revenue = input.max_revenue;
        self.regions = input.regions;
        self.pain_points = input.pain_points;
        self.tech_option_ids = input.tech_option_ids;
    }

    fn touch(&mut self, now: i64) {
        self.updated_at = now;
    }
}

impl OwnedEntity for Icp {
    fn from_input(id: RecordId, owner: UserId, input: IcpInput, now: i64) -> Self {
        let mut icp = Icp {
            id,
            owner_id: owner,
            name: String::new(),
            description: None,
            industries: Vec::new(),
            company_sizes: Vec::new(),
            min_employees: None,
            max_employees: None,
            min_revenue: None,
            max_revenue: None,
            regions: Vec::new(),
            pain_points: Vec::new(),
            tech_option_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        icp.apply_input(input, now);
        icp
    }
}

pub type IcpActions = OwnedCrud<Icp>;
