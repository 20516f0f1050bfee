//! People at prospect and customer organizations.

use crate::crud::{OwnedCrud, OwnedEntity};
use crate::entity::{EntityFilters, EntityKind, id_clause, search_clause};
use crate::error::ActionResult;
use crate::validation::{MAX_NAME_LEN, MAX_TEXT_LEN, Validate, ValidationErrors};
use salesdesk_storage::FieldClause;
use salesdesk_types::{EntityType, Principal, RecordId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: RecordId,
    pub owner_id: UserId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub job_title: Option<String>,
    pub organization_id: Option<RecordId>,
    pub linkedin_url: Option<String>,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

owned_record!(Contact, EntityType::Contact);

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ContactInput {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub job_title: Option<String>,
    pub organization_id: Option<RecordId>,
    pub linkedin_url: Option<String>,
    pub notes: Option<String>,
}

impl Validate for ContactInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.required_text("name", &self.name, MAX_NAME_LEN);
        errors.email("email", self.email.as_deref());
        errors.optional_text("phone", self.phone.as_deref(), 40);
        errors.optional_text("job_title", self.job_title.as_deref(), MAX_NAME_LEN);
        errors.url("linkedin_url", self.linkedin_url.as_deref());
        errors.optional_text("notes", self.notes.as_deref(), MAX_TEXT_LEN);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ContactFilters {
    /// Matches name, email or phone.
    pub search: Option<String>,
    pub organization_id: Option<RecordId>,
}

impl EntityFilters for ContactFilters {
    fn clauses(&self) -> Vec<FieldClause> {
        [
            search_clause(&["name", "email", "phone"], self.search.as_deref()),
            id_clause("organization_id", self.organization_id.as_ref()),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// Empty strings from form fields mean "not set".
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl EntityKind for Contact {
    const NOT_FOUND: &'static str = "Contato não encontrado";
    type Input = ContactInput;
    type Filters = ContactFilters;

    fn apply_input(&mut self, input: ContactInput, _now: i64) {
        self.name = input.name.trim().to_string();
        self.email = non_blank(input.email).map(|e| e.to_lowercase());
        self.phone = non_blank(input.phone);
        self.job_title = non_blank(input.job_title);
        self.organization_id = input.organization_id;
        self.linkedin_url = non_blank(input.linkedin_url);
        self.notes = input.notes;
    }

    fn touch(&mut self, now: i64) {
        self.updated_at = now;
    }
}

impl OwnedEntity for Contact {
    fn from_input(id: RecordId, owner: UserId, input: ContactInput, now: i64) -> Self {
        let mut contact = Contact {
            id,
            owner_id: owner,
            name: String::new(),
            email: None,
            phone: None,
            job_title: None,
            organization_id: None,
            linkedin_url: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        contact.apply_input(input, now);
        contact
    }
}

pub type ContactActions = OwnedCrud<Contact>;

impl OwnedCrud<Contact> {
    /// Link the contact to an organization, or unlink it with `None`.
    pub async fn set_organization(
        &self,
        principal: Option<&Principal>,
        id: &RecordId,
        organization_id: Option<RecordId>,
    ) -> ActionResult<Contact> {
        self.mutate(principal, id, move |contact, _| {
            contact.organization_id = organization_id;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_optionals_are_dropped_and_email_lowercased() {
        let input = ContactInput {
            name: "  Ana Souza ".into(),
            email: Some("Ana@Acme.com.br".into()),
            phone: Some("   ".into()),
            ..ContactInput::default()
        };
        assert!(input.validate().is_ok());
        let contact = Contact::from_input(RecordId::from("c1"), UserId::new("a"), input, 7);
        assert_eq!(contact.name, "Ana Souza");
        assert_eq!(contact.email.as_deref(), Some("ana@acme.com.br"));
        assert_eq!(contact.phone, None);
    }

    #[test]
    fn rejects_bad_email() {
        let input = ContactInput {
            name: "Ana".into(),
            email: Some("ana-at-acme".into()),
            ..ContactInput::default()
        };
        let errors = input.validate().unwrap_err();
        assert_eq!(errors.message_for("email"), Some(crate::validation::INVALID_EMAIL));
    }
}
