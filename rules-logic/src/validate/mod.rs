//! Rule logic validation.
//!
//! Three independent passes run over raw JSON: document structure, property
//! references, and operator support. Each returns its own result; expected
//! failures are data, never `Err`.

mod filters;
mod flags;
mod properties;
mod structure;

use serde::Serialize;

pub use filters::{validate_filter_types, FilterValidation};
pub use flags::validate_ignore_whitespace;
pub use properties::{validate_properties, validate_property_types, PropertyValidation};
pub use structure::{validate_object_type, validate_rule_logic, validate_workflow_rid};

/// Outcome of a single validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            warnings: Vec::new(),
        }
    }
}
