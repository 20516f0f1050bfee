//! Field-level validation for action inputs.
//!
//! Each input type implements [`Validate`] with the helpers below. Errors
//! carry the serialized field name as `path` so the presentation layer can
//! attach them to the right form control.

use serde::Serialize;
use std::fmt;

pub const REQUIRED: &str = "Campo obrigatório";
pub const INVALID_EMAIL: &str = "E-mail inválido";
pub const NEGATIVE: &str = "Valor não pode ser negativo";
pub const NOT_A_PERCENTAGE: &str = "Deve estar entre 0 e 100";
pub const INVERTED_RANGE: &str = "Mínimo não pode ser maior que o máximo";
pub const INVALID_COLOR: &str = "Cor inválida";
pub const INVALID_URL: &str = "URL inválida";

/// Default upper bound for names and titles.
pub const MAX_NAME_LEN: usize = 200;
/// Upper bound for free-text notes and descriptions.
pub const MAX_TEXT_LEN: usize = 5_000;

/// One failed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

/// Every field error found in one input.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(path, message);
        errors
    }

    pub fn add(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            path: path.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Message for one field, if it failed.
    pub fn message_for(&self, path: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.path == path)
            .map(|e| e.message.as_str())
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    pub fn required_text(&mut self, path: &str, value: &str, max: usize) {
        if value.trim().is_empty() {
            self.add(path, REQUIRED);
        } else {
            self.max_len(path, value, max);
        }
    }

    pub fn optional_text(&mut self, path: &str, value: Option<&str>, max: usize) {
        if let Some(value) = value {
            self.max_len(path, value, max);
        }
    }

    fn max_len(&mut self, path: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.add(path, format!("Máximo de {max} caracteres"));
        }
    }

    pub fn email(&mut self, path: &str, value: Option<&str>) {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return;
        };
        let valid = match value.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
                    && !domain.contains('@')
                    && !value.contains(char::is_whitespace)
            }
            None => false,
        };
        if !valid {
            self.add(path, INVALID_EMAIL);
        }
    }

    pub fn url(&mut self, path: &str, value: Option<&str>) {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return;
        };
        let rest = value
            .strip_prefix("https://")
            .or_else(|| value.strip_prefix("http://"));
        if !rest.is_some_and(|r| r.contains('.') && !r.contains(char::is_whitespace)) {
            self.add(path, INVALID_URL);
        }
    }

    pub fn non_negative(&mut self, path: &str, value: Option<f64>) {
        if value.is_some_and(|v| !v.is_finite() || v < 0.0) {
            self.add(path, NEGATIVE);
        }
    }

    pub fn percentage(&mut self, path: &str, value: Option<f64>) {
        if value.is_some_and(|v| !(0.0..=100.0).contains(&v)) {
            self.add(path, NOT_A_PERCENTAGE);
        }
    }

    /// `min <= max` when both are present. Reported on the `max` path.
    pub fn ordered<T: PartialOrd>(&mut self, max_path: &str, min: Option<T>, max: Option<T>) {
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                self.add(max_path, INVERTED_RANGE);
            }
        }
    }

    /// `#RRGGBB`.
    pub fn hex_color(&mut self, path: &str, value: &str) {
        let valid = value.len() == 7
            && value.starts_with('#')
            && value[1..].chars().all(|c| c.is_ascii_hexdigit());
        if !valid {
            self.add(path, INVALID_COLOR);
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for e in &self.errors {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.path, e.message)?;
            first = false;
        }
        Ok(())
    }
}

/// Schema check for an action input.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

impl Validate for () {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}
