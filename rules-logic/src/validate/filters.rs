use rules_core::config::ValidationConfig;
use serde::Serialize;
use serde_json::Value;

use crate::extract::{logic_filter_types, UsedFilters};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub used_filters: UsedFilters,
}

/// Checks operators against the configured allow and deny lists.
///
/// Denied string operators are errors. Operators outside an allow list only
/// produce warnings; numeric and null lists are skipped when empty.
pub fn validate_filter_types(logic: &Value, config: &ValidationConfig) -> FilterValidation {
    let used = logic_filter_types(logic);
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for op in &used.string {
        if config.unsupported_string_filters.contains(op) {
            errors.push(format!(
                "String filter type \"{op}\" is not supported. Use one of: {}",
                config.supported_string_filters.join(", ")
            ));
        } else if !config.supported_string_filters.contains(op) {
            warnings.push(format!(
                "String filter type \"{op}\" is not in the list of tested filters. \
                 It may not render correctly in the UI."
            ));
        }
    }

    let allow_lists = [
        ("Numeric", &used.numeric, &config.supported_numeric_filters),
        ("Null", &used.null, &config.supported_null_filters),
    ];
    for (label, ops, supported) in allow_lists {
        if supported.is_empty() {
            continue;
        }
        for op in ops.iter().filter(|op| !supported.contains(*op)) {
            warnings.push(format!(
                "{label} filter type \"{op}\" is not in the list of tested filters."
            ));
        }
    }

    FilterValidation {
        valid: errors.is_empty(),
        errors,
        warnings,
        used_filters: used,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> ValidationConfig {
        serde_json::from_value(json!({
            "grammarVersion": "V1",
            "supportedStrategyTypes": ["filterNode"],
            "supportedStringFilters": ["EQUALS", "CONTAINS"],
            "unsupportedStringFilters": ["REGEX"],
            "supportedNumericFilters": ["LESS_THAN"],
        }))
        .expect("config")
    }

    fn leaf(kind: &str, op: &str) -> Value {
        json!({
            "columnFilterRule": {
                "column": {"objectProperty": {"objectTypeId": "o", "propertyTypeId": "p"}, "type": "objectProperty"},
                "filter": {kind: {"type": op, "values": []}, "type": kind},
            },
            "type": "columnFilterRule",
        })
    }

    fn logic(filters: Vec<Value>) -> Value {
        json!({"strategy": {"type": "filterNode", "filterNode": {
            "filter": {"andFilterRule": {"filters": filters}, "type": "andFilterRule"}
        }}})
    }

    #[test]
    fn denied_string_operator_is_an_error() {
        let result = validate_filter_types(&logic(vec![leaf("stringColumnFilter", "REGEX")]), &config());
        assert!(!result.valid);
        assert_eq!(
            result.errors,
            vec!["String filter type \"REGEX\" is not supported. Use one of: EQUALS, CONTAINS"]
        );
    }

    #[test]
    fn untested_string_operator_is_a_warning() {
        let result =
            validate_filter_types(&logic(vec![leaf("stringColumnFilter", "STARTS_WITH")]), &config());
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("STARTS_WITH"));
        assert!(result.warnings[0].contains("may not render correctly"));
    }

    #[test]
    fn numeric_and_null_allow_lists() {
        let result = validate_filter_types(
            &logic(vec![
                leaf("numericColumnFilter", "LESS_THAN"),
                leaf("numericColumnFilter", "GREATER_THAN"),
                leaf("nullColumnFilter", "NOT_NULL"),
            ]),
            &config(),
        );
        assert!(result.valid);
        assert_eq!(
            result.warnings,
            vec!["Numeric filter type \"GREATER_THAN\" is not in the list of tested filters."]
        );
        assert_eq!(result.used_filters.numeric, vec!["GREATER_THAN", "LESS_THAN"]);
        assert_eq!(result.used_filters.null, vec!["NOT_NULL"]);
    }

    #[test]
    fn no_filter_is_valid() {
        let result = validate_filter_types(&json!({}), &config());
        assert!(result.valid);
        assert!(result.warnings.is_empty());
        assert!(result.used_filters.is_empty());
    }

    fn malformed_string_leaf(payload: Value) -> Value {
        json!({
            "columnFilterRule": {
                "column": {"objectProperty": {"propertyTypeId": "p"}, "type": "objectProperty"},
                "filter": {"stringColumnFilter": payload, "type": "stringColumnFilter"},
            },
            "type": "columnFilterRule",
        })
    }

    #[test]
    fn denied_operator_is_reported_when_siblings_are_malformed() {
        let payloads = [
            json!({"type": "REGEX", "caseSensitive": "true", "values": ["a.*"]}),
            json!({"type": "REGEX", "values": "a.*"}),
            json!({"type": "REGEX", "ignoreWhitespace": 1}),
        ];

        for payload in payloads {
            let result = validate_filter_types(&logic(vec![malformed_string_leaf(payload)]), &config());
            assert!(!result.valid);
            assert_eq!(result.used_filters.string, vec!["REGEX"]);
            assert!(result.errors[0].contains("REGEX"));
            assert!(result.errors[0].contains("not supported"));
        }
    }
}
