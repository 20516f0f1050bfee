//! Reference catalog: pipelines, stages, products, business lines, labels
//! and tech options. None of these have an owner.

use crate::catalog::{CatalogCrud, CatalogEntity};
use crate::entity::{
    EntityFilters, EntityKind, id_clause, now_millis, require_principal, search_clause,
};
use crate::error::{ActionError, ActionResult};
use crate::validation::{MAX_NAME_LEN, MAX_TEXT_LEN, REQUIRED, Validate, ValidationErrors};
use salesdesk_storage::{FieldClause, RecordFilter, Sort};
use salesdesk_types::{EntityType, Principal, RecordId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ── Pipeline ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: RecordId,
    pub name: String,
    pub description: Option<String>,
    pub is_default: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

reference_record!(Pipeline, EntityType::Pipeline);

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineInput {
    pub name: String,
    pub description: Option<String>,
    pub is_default: bool,
}

impl Validate for PipelineInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.required_text("name", &self.name, MAX_NAME_LEN);
        errors.optional_text("description", self.description.as_deref(), MAX_TEXT_LEN);
        errors.into_result()
    }
}

impl EntityKind for Pipeline {
    const NOT_FOUND: &'static str = "Pipeline não encontrado";
    type Input = PipelineInput;
    type Filters = ();

    fn default_sort() -> Sort {
        Sort::asc("name")
    }

    fn apply_input(&mut self, input: PipelineInput, _now: i64) {
        self.name = input.name.trim().to_string();
        self.description = input.description;
        self.is_default = input.is_default;
    }

    fn touch(&mut self, now: i64) {
        self.updated_at = now;
    }
}

impl CatalogEntity for Pipeline {
    fn from_input(id: RecordId, input: PipelineInput, now: i64) -> Self {
        let mut pipeline = Pipeline {
            id,
            name: String::new(),
            description: None,
            is_default: false,
            created_at: now,
            updated_at: now,
        };
        pipeline.apply_input(input, now);
        pipeline
    }
}

pub type PipelineActions = CatalogCrud<Pipeline>;

// ── Stage ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub id: RecordId,
    pub pipeline_id: RecordId,
    pub name: String,
    /// Order within the pipeline, starting at zero.
    pub position: u32,
    pub probability: Option<f64>,
    pub color: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

reference_record!(Stage, EntityType::Stage);

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StageInput {
    pub pipeline_id: String,
    pub name: String,
    pub position: u32,
    pub probability: Option<f64>,
    pub color: Option<String>,
}

impl Validate for StageInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.pipeline_id.trim().is_empty() {
            errors.add("pipeline_id", REQUIRED);
        }
        errors.required_text("name", &self.name, MAX_NAME_LEN);
        errors.percentage("probability", self.probability);
        if let Some(color) = &self.color {
            errors.hex_color("color", color);
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StageFilters {
    pub pipeline_id: Option<RecordId>,
}

impl EntityFilters for StageFilters {
    fn clauses(&self) -> Vec<FieldClause> {
        id_clause("pipeline_id", self.pipeline_id.as_ref())
            .into_iter()
            .collect()
    }
}

impl EntityKind for Stage {
    const NOT_FOUND: &'static str = "Etapa não encontrada";
    type Input = StageInput;
    type Filters = StageFilters;

    fn default_sort() -> Sort {
        Sort::asc("position")
    }

    fn apply_input(&mut self, input: StageInput, _now: i64) {
        self.pipeline_id = RecordId::from(input.pipeline_id.trim());
        self.name = input.name.trim().to_string();
        self.position = input.position;
        self.probability = input.probability;
        self.color = input.color;
    }

    fn touch(&mut self, now: i64) {
        self.updated_at = now;
    }
}

impl CatalogEntity for Stage {
    fn from_input(id: RecordId, input: StageInput, now: i64) -> Self {
        let mut stage = Stage {
            id,
            pipeline_id: RecordId::from(""),
            name: String::new(),
            position: 0,
            probability: None,
            color: None,
            created_at: now,
            updated_at: now,
        };
        stage.apply_input(input, now);
        stage
    }
}

pub type StageActions = CatalogCrud<Stage>;

const DUPLICATE_STAGE: &str = "Etapa repetida na ordenação";

impl CatalogCrud<Stage> {
    /// Renumber stages of one pipeline in the given order, from zero.
    /// Stages left out of `ordered` keep their position. An id may appear
    /// only once.
    pub async fn reorder(
        &self,
        principal: Option<&Principal>,
        pipeline_id: &RecordId,
        ordered: &[RecordId],
    ) -> ActionResult<Vec<Stage>> {
        require_principal(principal)?;
        let mut seen = HashSet::with_capacity(ordered.len());
        if !ordered.iter().all(|id| seen.insert(id)) {
            return Err(ValidationErrors::single("ordered", DUPLICATE_STAGE).into());
        }
        let filter = RecordFilter::all().with_clause(FieldClause::eq("pipeline_id", pipeline_id.as_str()));
        let stages = self
            .repository()
            .find_many(&filter, &Stage::default_sort(), None)
            .await?;

        let now = now_millis();
        let mut reordered = Vec::with_capacity(ordered.len());
        for (position, id) in ordered.iter().enumerate() {
            let Some(stage) = stages.iter().find(|s| &s.id == id) else {
                return Err(ActionError::NotFound(Stage::NOT_FOUND));
            };
            let mut stage = stage.clone();
            stage.position = position as u32;
            stage.touch(now);
            reordered.push(stage);
        }
        let mut saved = Vec::with_capacity(reordered.len());
        for stage in reordered {
            saved.push(self.repository().update(stage).await?);
        }
        Ok(saved)
    }
}

// ── Product ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: RecordId,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub currency: String,
    pub business_line_id: Option<RecordId>,
    pub active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

reference_record!(Product, EntityType::Product);

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProductInput {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub currency: Option<String>,
    pub business_line_id: Option<RecordId>,
    pub active: bool,
}

impl Default for ProductInput {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            price: 0.0,
            currency: None,
            business_line_id: None,
            active: true,
        }
    }
}

impl Validate for ProductInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.required_text("name", &self.name, MAX_NAME_LEN);
        errors.non_negative("price", Some(self.price));
        errors.optional_text("description", self.description.as_deref(), MAX_TEXT_LEN);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProductFilters {
    pub search: Option<String>,
    pub business_line_id: Option<RecordId>,
    pub active: Option<bool>,
}

impl EntityFilters for ProductFilters {
    fn clauses(&self) -> Vec<FieldClause> {
        [
            search_clause(&["name", "description"], self.search.as_deref()),
            id_clause("business_line_id", self.business_line_id.as_ref()),
            self.active.map(|a| FieldClause::eq("active", a)),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

impl EntityKind for Product {
    const NOT_FOUND: &'static str = "Produto não encontrado";
    type Input = ProductInput;
    type Filters = ProductFilters;

    fn default_sort() -> Sort {
        Sort::asc("name")
    }

    fn apply_input(&mut self, input: ProductInput, _now: i64) {
        self.name = input.name.trim().to_string();
        self.description = input.description;
        self.price = input.price;
        self.currency = input
            .currency
            .unwrap_or_else(|| crate::entities::deal::DEFAULT_CURRENCY.to_string());
        self.business_line_id = input.business_line_id;
        self.active = input.active;
    }

    fn touch(&mut self, now: i64) {
        self.updated_at = now;
    }
}

impl CatalogEntity for Product {
    fn from_input(id: RecordId, input: ProductInput, now: i64) -> Self {
        let mut product = Product {
            id,
            name: String::new(),
            description: None,
            price: 0.0,
            currency: String::new(),
            business_line_id: None,
            active: true,
            created_at: now,
            updated_at: now,
        };
        product.apply_input(input, now);
        product
    }
}

pub type ProductActions = CatalogCrud<Product>;

// ── Business line ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessLine {
    pub id: RecordId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

reference_record!(BusinessLine, EntityType::BusinessLine);

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BusinessLineInput {
    pub name: String,
    pub description: Option<String>,
}

impl Validate for BusinessLineInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.required_text("name", &self.name, MAX_NAME_LEN);
        errors.optional_text("description", self.description.as_deref(), MAX_TEXT_LEN);
        errors.into_result()
    }
}

impl EntityKind for BusinessLine {
    const NOT_FOUND: &'static str = "Linha de negócio não encontrada";
    type Input = BusinessLineInput;
    type Filters = ();

    fn default_sort() -> Sort {
        Sort::asc("name")
    }

    fn apply_input(&mut self, input: BusinessLineInput, _now: i64) {
        self.name = input.name.trim().to_string();
        self.description = input.description;
    }

    fn touch(&mut self, now: i64) {
        self.updated_at = now;
    }
}

impl CatalogEntity for BusinessLine {
    fn from_input(id: RecordId, input: BusinessLineInput, now: i64) -> Self {
        let mut line = BusinessLine {
            id,
            name: String::new(),
            description: None,
            created_at: now,
            updated_at: now,
        };
        line.apply_input(input, now);
        line
    }
}

pub type BusinessLineActions = CatalogCrud<BusinessLine>;

// ── Label ───────────────────────────────────────────────────────

pub const DEFAULT_LABEL_COLOR: &str = "#6B7280";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: RecordId,
    pub name: String,
    /// `#RRGGBB`.
    pub color: String,
    pub created_at: i64,
    pub updated_at: i64,
}

reference_record!(Label, EntityType::Label);

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LabelInput {
    pub name: String,
    pub color: Option<String>,
}

impl Validate for LabelInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.required_text("name", &self.name, 50);
        if let Some(color) = &self.color {
            errors.hex_color("color", color);
        }
        errors.into_result()
    }
}

impl EntityKind for Label {
    const NOT_FOUND: &'static str = "Etiqueta não encontrada";
    type Input = LabelInput;
    type Filters = ();

    fn default_sort() -> Sort {
        Sort::asc("name")
    }

    fn apply_input(&mut self, input: LabelInput, _now: i64) {
        self.name = input.name.trim().to_string();
        self.color = input
            .color
            .unwrap_or_else(|| DEFAULT_LABEL_COLOR.to_string())
            .to_uppercase();
    }

    fn touch(&mut self, now: i64) {
        self.updated_at = now;
    }
}

impl CatalogEntity for Label {
    fn from_input(id: RecordId, input: LabelInput, now: i64) -> Self {
        let mut label = Label {
            id,
            name: String::new(),
            color: String::new(),
            created_at: now,
            updated_at: now,
        };
        label.apply_input(input, now);
        label
    }
}

pub type LabelActions = CatalogCrud<Label>;

// ── Tech option ─────────────────────────────────────────────────

/// One entry of the tech-stack catalog, e.g. category `crm`, name `HubSpot`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechOption {
    pub id: RecordId,
    pub category: String,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

reference_record!(TechOption, EntityType::TechOption);

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TechOptionInput {
    pub category: String,
    pub name: String,
}

impl Validate for TechOptionInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.required_text("category", &self.category, 50);
        errors.required_text("name", &self.name, MAX_NAME_LEN);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TechOptionFilters {
    pub category: Option<String>,
    pub search: Option<String>,
}

impl EntityFilters for TechOptionFilters {
    fn clauses(&self) -> Vec<FieldClause> {
        [
            self.category
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(|c| FieldClause::eq("category", c.to_lowercase())),
            search_clause(&["name"], self.search.as_deref()),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

impl EntityKind for TechOption {
    const NOT_FOUND: &'static str = "Opção de tecnologia não encontrada";
    type Input = TechOptionInput;
    type Filters = TechOptionFilters;

    fn default_sort() -> Sort {
        Sort::asc("name")
    }

    fn apply_input(&mut self, input: TechOptionInput, _now: i64) {
        self.category = input.category.trim().to_lowercase();
        self.name = input.name.trim().to_string();
    }

    fn touch(&mut self, now: i64) {
        self.updated_at = now;
    }
}

impl CatalogEntity for TechOption {
    fn from_input(id: RecordId, input: TechOptionInput, now: i64) -> Self {
        let mut option = TechOption {
            id,
            category: String::new(),
            name: String::new(),
            created_at: now,
            updated_at: now,
        };
        option.apply_input(input, now);
        option
    }
}

pub type TechOptionActions = CatalogCrud<TechOption>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::INVALID_COLOR;

    #[test]
    fn label_color_defaults_and_normalizes() {
        let label = Label::from_input(RecordId::from("l1"), LabelInput { name: "Hot".into(), color: None }, 1);
        assert_eq!(label.color, DEFAULT_LABEL_COLOR);
        let label = Label::from_input(
            RecordId::from("l2"),
            LabelInput {
                name: "Cold".into(),
                color: Some("#1e40af".into()),
            },
            1,
        );
        assert_eq!(label.color, "#1E40AF");

        let bad = LabelInput {
            name: "x".into(),
            color: Some("blue".into()),
        };
        assert_eq!(bad.validate().unwrap_err().message_for("color"), Some(INVALID_COLOR));
    }

    #[test]
    fn stage_requires_pipeline() {
        let input = StageInput {
            name: "Proposta".into(),
            ..StageInput::default()
        };
        assert_eq!(input.validate().unwrap_err().message_for("pipeline_id"), Some(REQUIRED));
    }

    #[test]
    fn product_defaults_active_with_brl() {
        let input: ProductInput = serde_json::from_value(serde_json::json!({
            "name": "Licença anual",
            "price": 1200.0
        }))
        .unwrap();
        let product = Product::from_input(RecordId::from("p1"), input, 1);
        assert!(product.active);
        assert_eq!(product.currency, "BRL");
    }
}
