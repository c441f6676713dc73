use rules_core::config::ValidationConfig;
use rules_protocol::filter::FilterKind;
use serde_json::Value;

use super::ValidationResult;
use crate::extract::filter_view;

/// String leaves using an operator listed in `requireIgnoreWhitespace` must
/// set `ignoreWhitespace` to `true` explicitly.
pub fn validate_ignore_whitespace(logic: &Value, config: &ValidationConfig) -> ValidationResult {
    if config.require_ignore_whitespace.is_empty() {
        return ValidationResult::from_errors(Vec::new());
    }
    let Some(view) = filter_view(logic) else {
        return ValidationResult::from_errors(Vec::new());
    };

    let mut errors = Vec::new();
    for leaf in view.leaves() {
        if leaf.kind() != Some(FilterKind::String) {
            continue;
        }
        let Some(op) = leaf.op() else {
            continue;
        };
        if !config.require_ignore_whitespace.iter().any(|required| required == op) {
            continue;
        }
        if leaf.ignore_whitespace() != Some(true) {
            let message = format!(
                "String filter \"{}\" on property \"{}\" must set ignoreWhitespace to true",
                op,
                leaf.property_id().unwrap_or("<unknown>")
            );
            if !errors.contains(&message) {
                errors.push(message);
            }
        }
    }
    ValidationResult::from_errors(errors)
}
