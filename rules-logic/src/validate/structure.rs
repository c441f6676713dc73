use rules_core::config::ValidationConfig;
use rules_protocol::logic::{EFFECT_V2, FILTER_NODE};
use serde_json::Value;

use super::ValidationResult;
use crate::extract::{extract_object_type_id, extract_workflow_rid};

fn describe(value: Option<&Value>) -> String {
    match value {
        None => "missing".to_string(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

fn is_present_object(value: Option<&Value>) -> Option<&serde_json::Map<String, Value>> {
    value.and_then(Value::as_object).filter(|map| !map.is_empty())
}

/// Checks the document envelope against `config`.
///
/// Every problem in the envelope is reported; nothing below the strategy
/// payload is inspected.
pub fn validate_rule_logic(logic: &Value, config: &ValidationConfig) -> ValidationResult {
    let Some(root) = logic.as_object().filter(|root| !root.is_empty()) else {
        return ValidationResult::from_errors(vec!["Root must be an object".to_string()]);
    };
    let mut errors = Vec::new();

    let grammar = root.get("grammarVersion");
    if grammar.and_then(Value::as_str) != Some(config.grammar_version.as_str()) {
        errors.push(format!(
            "grammarVersion must be '{}', got: {}",
            config.grammar_version,
            describe(grammar)
        ));
    }

    let rid_ok = root
        .get("workflowRid")
        .and_then(Value::as_str)
        .is_some_and(|rid| !rid.is_empty());
    if !rid_ok {
        errors.push("workflowRid is required and must be a string".to_string());
    }

    match is_present_object(root.get("strategy")) {
        None => errors.push("strategy is required and must be an object".to_string()),
        Some(strategy) => {
            let kind = strategy.get("type");
            let kind_str = kind.and_then(Value::as_str);
            let supported = kind_str
                .is_some_and(|kind| config.supported_strategy_types.iter().any(|s| s == kind));
            if !supported {
                errors.push(format!(
                    "strategy.type must be one of [{}], got: {}",
                    config.supported_strategy_types.join(", "),
                    describe(kind)
                ));
            }

            if let Some(kind) = kind_str.filter(|kind| !kind.is_empty()) {
                if !strategy.contains_key(kind) {
                    errors.push(format!(
                        "strategy.{kind} is required when type is '{kind}'"
                    ));
                }
                if kind == FILTER_NODE {
                    let carries_type = strategy
                        .get(FILTER_NODE)
                        .and_then(Value::as_object)
                        .is_some_and(|node| node.contains_key("type"));
                    if carries_type {
                        errors.push(
                            "filterNode should NOT have a type field (type goes in strategy)"
                                .to_string(),
                        );
                    }
                }
            }
        }
    }

    match is_present_object(root.get("effect")) {
        None => errors.push("effect is required and must be an object".to_string()),
        Some(effect) => {
            let kind = effect.get("type");
            if kind.and_then(Value::as_str) != Some(EFFECT_V2) {
                errors.push(format!("effect.type must be 'v2', got: {}", describe(kind)));
            }
            match is_present_object(effect.get(EFFECT_V2)) {
                None => errors.push("effect.v2 is required".to_string()),
                Some(v2) => {
                    if is_present_object(v2.get("outputAndVersion")).is_none() {
                        errors.push("effect.v2.outputAndVersion is required".to_string());
                    }
                }
            }
        }
    }

    ValidationResult::from_errors(errors)
}

/// The document must target `expected` as its workflow.
pub fn validate_workflow_rid(logic: &Value, expected: &str) -> ValidationResult {
    let errors = match extract_workflow_rid(logic) {
        None => vec!["workflowRid not found in rule logic".to_string()],
        Some(actual) if actual != expected => vec![format!(
            "workflowRid mismatch: expected '{expected}', got '{actual}'"
        )],
        Some(_) => Vec::new(),
    };
    ValidationResult::from_errors(errors)
}

/// The document must read from the `expected` object type.
pub fn validate_object_type(logic: &Value, expected: &str) -> ValidationResult {
    let errors = match extract_object_type_id(logic) {
        None => vec!["objectTypeId not found in rule logic".to_string()],
        Some(actual) if actual != expected => vec![format!(
            "objectTypeId mismatch: expected '{expected}', got '{actual}'"
        )],
        Some(_) => Vec::new(),
    };
    ValidationResult::from_errors(errors)
}
