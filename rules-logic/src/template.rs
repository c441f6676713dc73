//! Builds filter trees and rule logic from named templates.

use std::fmt;
use std::str::FromStr;

use rules_core::config::WorkflowDefinition;
use rules_protocol::filter::{
    ops, ColumnFilter, ColumnFilterRule, ColumnRef, FilterTree, NullColumnFilter,
    NumericColumnFilter, StringColumnFilter,
};
use rules_protocol::logic::{OutputAndVersion, RuleLogic};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use tracing::debug;

use crate::error::BuildError;

/// The built-in templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    StringEquals,
    StringOr,
    NumericRange,
    NullCheck,
}

impl Template {
    pub const ALL: [Template; 4] = [
        Template::StringEquals,
        Template::StringOr,
        Template::NumericRange,
        Template::NullCheck,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Template::StringEquals => "string-equals",
            Template::StringOr => "string-or",
            Template::NumericRange => "numeric-range",
            Template::NullCheck => "null-check",
        }
    }

    pub fn info(&self) -> TemplateInfo {
        let (description, parameters): (&'static str, &'static [&'static str]) = match self {
            Template::StringEquals => (
                "Simple string equality filter",
                &["propertyId", "value", "caseSensitive?"][..],
            ),
            Template::StringOr => (
                "OR filter with multiple string values",
                &["propertyId", "values[]", "caseSensitive?"][..],
            ),
            Template::NumericRange => (
                "Numeric range filter (min <= value <= max)",
                &["propertyId", "min?", "max?"][..],
            ),
            Template::NullCheck => (
                "Check if property is null or not null",
                &["propertyId", "isNull?"][..],
            ),
        };
        TemplateInfo {
            name: self.name(),
            description,
            parameters: parameters.to_vec(),
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Template {
    type Err = BuildError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Template::ALL
            .into_iter()
            .find(|template| template.name() == name)
            .ok_or_else(|| BuildError::new(format!("Unknown template: {name}")))
    }
}

/// Name, description and parameter signature of a built-in template.
///
/// A trailing `?` marks an optional parameter, `[]` an array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Vec<&'static str>,
}

pub fn builtin_templates() -> Vec<TemplateInfo> {
    Template::ALL.iter().map(Template::info).collect()
}

pub fn template_info(name: &str) -> Option<TemplateInfo> {
    name.parse::<Template>().ok().map(|template| template.info())
}

fn column(object_type_id: &str, property_id: &str) -> ColumnRef {
    ColumnRef::object_property(object_type_id, property_id)
}

pub fn string_equals(
    object_type_id: &str,
    property_id: &str,
    value: &str,
    case_sensitive: bool,
) -> FilterTree {
    let filter = StringColumnFilter::new(ops::EQUALS, vec![value.to_string()])
        .case_sensitive(case_sensitive)
        .ignore_whitespace(false);
    FilterTree::column(ColumnFilterRule::new(
        column(object_type_id, property_id),
        ColumnFilter::String(filter),
    ))
}

/// One `EQUALS` leaf per value under an `Or`, even for a single value.
pub fn string_or(
    object_type_id: &str,
    property_id: &str,
    values: &[String],
    case_sensitive: bool,
) -> FilterTree {
    FilterTree::or(
        values
            .iter()
            .map(|value| string_equals(object_type_id, property_id, value, case_sensitive))
            .collect(),
    )
}

pub fn numeric_comparison(
    object_type_id: &str,
    property_id: &str,
    op: &str,
    value: Number,
) -> FilterTree {
    FilterTree::column(ColumnFilterRule::new(
        column(object_type_id, property_id),
        ColumnFilter::Numeric(NumericColumnFilter::new(op, vec![value])),
    ))
}

/// `min <= value <= max`; a single bound yields a single leaf.
pub fn numeric_range(
    object_type_id: &str,
    property_id: &str,
    min: Option<Number>,
    max: Option<Number>,
) -> Result<FilterTree, BuildError> {
    let mut bounds = Vec::with_capacity(2);
    if let Some(min) = min {
        bounds.push(numeric_comparison(
            object_type_id,
            property_id,
            ops::GREATER_THAN_OR_EQUAL,
            min,
        ));
    }
    if let Some(max) = max {
        bounds.push(numeric_comparison(
            object_type_id,
            property_id,
            ops::LESS_THAN_OR_EQUAL,
            max,
        ));
    }

    match bounds.len() {
        0 => Err(BuildError::new("At least one of min or max is required")),
        1 => Ok(bounds.remove(0)),
        _ => Ok(FilterTree::and(bounds)),
    }
}

pub fn null_check(object_type_id: &str, property_id: &str, is_null: bool) -> FilterTree {
    let op = if is_null { ops::NULL } else { ops::NOT_NULL };
    FilterTree::column(ColumnFilterRule::new(
        column(object_type_id, property_id),
        ColumnFilter::Null(NullColumnFilter::new(op)),
    ))
}

/// Wraps a filter into a complete `filterNode` rule for `workflow`.
pub fn wrap_filter_as_rule_logic(filter: FilterTree, workflow: &WorkflowDefinition) -> RuleLogic {
    RuleLogic::filter_node(
        workflow.object_type.id.clone(),
        filter,
        workflow.workflow_rid.clone(),
        OutputAndVersion {
            output_id: workflow.output.id.clone(),
            output_version: workflow.output.version.clone(),
            workflow_rid: workflow.workflow_rid.clone(),
        },
    )
}

/// Accumulates parameter problems so every one of them is reported at once.
///
/// Accessors record a failure and hand back a placeholder; [`Params::finish`]
/// only releases the read values when nothing was recorded.
struct Params<'a> {
    raw: &'a Map<String, Value>,
    errors: Vec<String>,
}

impl<'a> Params<'a> {
    fn new(raw: &'a Map<String, Value>) -> Self {
        Self {
            raw,
            errors: Vec::new(),
        }
    }

    fn present(&self, name: &str) -> Option<&'a Value> {
        self.raw.get(name).filter(|value| !value.is_null())
    }

    fn missing(&mut self, name: &str) {
        self.errors
            .push(format!("Missing required parameter: {name}"));
    }

    fn invalid(&mut self, name: &str, expectation: &str) {
        self.errors
            .push(format!("Invalid parameter: {name} must be {expectation}"));
    }

    fn required_str(&mut self, name: &str) -> &'a str {
        match self.present(name) {
            Some(Value::String(text)) if !text.trim().is_empty() => text.as_str(),
            Some(Value::String(_)) | None => {
                self.missing(name);
                ""
            }
            Some(_) => {
                self.invalid(name, "a string");
                ""
            }
        }
    }

    fn required_str_list(&mut self, name: &str) -> Vec<String> {
        let items = match self.present(name) {
            None => {
                self.missing(name);
                return Vec::new();
            }
            Some(Value::Array(items)) => items,
            Some(_) => {
                self.invalid(name, "an array of strings");
                return Vec::new();
            }
        };
        if items.is_empty() {
            self.errors.push(format!("Parameter {name} must not be empty"));
            return Vec::new();
        }

        let strings: Option<Vec<String>> = items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect();
        strings.unwrap_or_else(|| {
            self.invalid(name, "an array of strings");
            Vec::new()
        })
    }

    fn optional_bool(&mut self, name: &str, default: bool) -> bool {
        match self.present(name) {
            None => default,
            Some(Value::Bool(flag)) => *flag,
            Some(_) => {
                self.invalid(name, "a boolean");
                default
            }
        }
    }

    fn optional_number(&mut self, name: &str) -> Option<Number> {
        match self.present(name) {
            None => None,
            Some(Value::Number(number)) => Some(number.clone()),
            Some(_) => {
                self.invalid(name, "a number");
                None
            }
        }
    }

    fn finish<T>(self, values: T) -> Result<T, BuildError> {
        if self.errors.is_empty() {
            Ok(values)
        } else {
            Err(BuildError {
                errors: self.errors,
            })
        }
    }
}

/// Builds the filter tree for `template` against `object_type_id`.
pub fn build_filter(
    template: Template,
    params: &Map<String, Value>,
    object_type_id: &str,
) -> Result<FilterTree, BuildError> {
    let mut p = Params::new(params);

    match template {
        Template::StringEquals => {
            let property_id = p.required_str("propertyId");
            let value = p.required_str("value");
            let case_sensitive = p.optional_bool("caseSensitive", false);
            let (property_id, value, case_sensitive) =
                p.finish((property_id, value, case_sensitive))?;
            Ok(string_equals(object_type_id, property_id, value, case_sensitive))
        }
        Template::StringOr => {
            let property_id = p.required_str("propertyId");
            let values = p.required_str_list("values");
            let case_sensitive = p.optional_bool("caseSensitive", false);
            let (property_id, values, case_sensitive) =
                p.finish((property_id, values, case_sensitive))?;
            Ok(string_or(object_type_id, property_id, &values, case_sensitive))
        }
        Template::NumericRange => {
            let property_id = p.required_str("propertyId");
            let min = p.optional_number("min");
            let max = p.optional_number("max");
            let bounds_given = p.present("min").is_some() || p.present("max").is_some();
            if !bounds_given {
                p.errors
                    .push("At least one of min or max is required".to_string());
            }
            let (property_id, min, max) = p.finish((property_id, min, max))?;
            numeric_range(object_type_id, property_id, min, max)
        }
        Template::NullCheck => {
            let property_id = p.required_str("propertyId");
            let is_null = p.optional_bool("isNull", true);
            let (property_id, is_null) = p.finish((property_id, is_null))?;
            Ok(null_check(object_type_id, property_id, is_null))
        }
    }
}

/// Builds a complete rule logic document from a named template.
///
/// Every parameter problem is collected before anything is built.
pub fn build_from_template(
    template_name: &str,
    params: &Map<String, Value>,
    workflow: &WorkflowDefinition,
) -> Result<RuleLogic, BuildError> {
    let template: Template = template_name.parse()?;
    let filter = build_filter(template, params, &workflow.object_type.id)?;

    debug!(
        template = %template,
        workflow = %workflow.name,
        compound = filter.is_compound(),
        "rule logic built from template"
    );
    Ok(wrap_filter_as_rule_logic(filter, workflow))
}

/// Loose parameter shapes accepted before the strict builder runs.
///
/// Only the shape matters; no field is read back.
#[derive(Deserialize)]
#[serde(untagged)]
enum LooseParams {
    StringEquals {
        #[serde(rename = "propertyId")]
        _property_id: String,
        #[serde(rename = "value")]
        _value: String,
        #[serde(default, rename = "caseSensitive")]
        _case_sensitive: Option<bool>,
    },
    StringOr {
        #[serde(rename = "propertyId")]
        _property_id: String,
        #[serde(rename = "values")]
        _values: Vec<String>,
        #[serde(default, rename = "caseSensitive")]
        _case_sensitive: Option<bool>,
    },
    NullCheck {
        #[serde(rename = "propertyId")]
        _property_id: String,
        #[serde(default, rename = "isNull")]
        _is_null: Option<bool>,
    },
    NumericRange {
        #[serde(rename = "propertyId")]
        _property_id: String,
        #[serde(default, rename = "min")]
        _min: Option<f64>,
        #[serde(default, rename = "max")]
        _max: Option<f64>,
    },
}

/// First-tier check: does `params` look like parameters of any template?
///
/// Deliberately permissive. The strict builder reports what is actually
/// missing for the chosen template.
pub fn precheck_template_params(params: &Value) -> bool {
    LooseParams::deserialize(params).is_ok()
}
