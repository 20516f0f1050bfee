use crate::TypeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every kind of record SalesDesk stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    // Owned records
    Deal,
    Contact,
    Lead,
    Organization,
    Partner,
    Activity,
    Icp,
    // Reference catalog
    Pipeline,
    Stage,
    Product,
    BusinessLine,
    Label,
    TechOption,
}

impl EntityType {
    pub const ALL: [EntityType; 13] = [
        EntityType::Deal,
        EntityType::Contact,
        EntityType::Lead,
        EntityType::Organization,
        EntityType::Partner,
        EntityType::Activity,
        EntityType::Icp,
        EntityType::Pipeline,
        EntityType::Stage,
        EntityType::Product,
        EntityType::BusinessLine,
        EntityType::Label,
        EntityType::TechOption,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Deal => "deal",
            EntityType::Contact => "contact",
            EntityType::Lead => "lead",
            EntityType::Organization => "organization",
            EntityType::Partner => "partner",
            EntityType::Activity => "activity",
            EntityType::Icp => "icp",
            EntityType::Pipeline => "pipeline",
            EntityType::Stage => "stage",
            EntityType::Product => "product",
            EntityType::BusinessLine => "business_line",
            EntityType::Label => "label",
            EntityType::TechOption => "tech_option",
        }
    }

    /// Whether records of this type carry an owner.
    pub fn is_owned(self) -> bool {
        matches!(
            self,
            EntityType::Deal
                | EntityType::Contact
                | EntityType::Lead
                | EntityType::Organization
                | EntityType::Partner
                | EntityType::Activity
                | EntityType::Icp
        )
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| TypeError::UnknownEntityType(s.to_string()))
    }
}
