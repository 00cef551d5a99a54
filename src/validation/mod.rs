//! Inbound request validation.
//!
//! Every write path runs its payload through a table of [`FieldSpec`]s before
//! any store access. Validation is all-or-nothing: either every declared field
//! passes and a normalized record is produced (strings trimmed, numbers
//! parsed, undeclared fields dropped), or the caller receives every violated
//! field at once.
//!
//! # Usage
//!
//! ```rust
//! use pet_adoption::validation::payloads;
//! use serde_json::json;
//!
//! let new_pet = payloads::pet_create(&json!({
//!     "name": "  Max ",
//!     "species": "dog",
//!     "breed": "Lab",
//!     "age": 2,
//!     "size": "medium",
//!     "description": "friendly",
//!     "status": "adopted"
//! }))
//! .unwrap();
//! assert_eq!(new_pet.name, "Max");
//!
//! let err = payloads::application_create(&json!({ "userId": "u1" })).unwrap_err();
//! assert_eq!(err.violations[0].field, "petId");
//! ```

pub mod payloads;
pub mod rules;

pub use rules::{FieldSpec, Rule, validate_record};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// A single violated field and the rule it broke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every field that failed validation for one request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed: {}", format_violations(.violations))]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub fn new(violations: Vec<FieldViolation>) -> Self {
        Self { violations }
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(vec![FieldViolation::new(field, message)])
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.violations.iter().map(|v| v.field.as_str())
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields().any(|f| f == field)
    }
}

fn format_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
