//! Errors crossing the action boundary.
//!
//! The presentation layer sees three kinds: `Unauthorized`, `NotFound` and
//! `Validation`. A record owned by someone else is reported with the same
//! `NotFound` message as a record that does not exist.

use crate::validation::ValidationErrors;
use salesdesk_access::AccessError;
use salesdesk_storage::StorageError;
use thiserror::Error;

/// Result type for actions.
pub type ActionResult<T> = Result<T, ActionError>;

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Não autorizado")]
    Unauthorized,

    /// Carries the entity's localized not-found message.
    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("grant store error: {0}")]
    Access(#[from] AccessError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ActionError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ActionError::Unauthorized)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ActionError::NotFound(_))
    }

    /// Field errors, if this is a validation failure.
    pub fn validation(&self) -> Option<&ValidationErrors> {
        match self {
            ActionError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for ActionError {
    fn from(errors: ValidationErrors) -> Self {
        ActionError::Validation(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_messages() {
        assert_eq!(ActionError::Unauthorized.to_string(), "Não autorizado");
        assert_eq!(
            ActionError::NotFound("Negócio não encontrado").to_string(),
            "Negócio não encontrado"
        );
        let v: ActionError = ValidationErrors::single("title", "Campo obrigatório").into();
        assert_eq!(v.to_string(), "title: Campo obrigatório");
        assert!(v.validation().is_some());
        assert!(!v.is_not_found());
    }
}
