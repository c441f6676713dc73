//! Proposal validation: build or accept logic, then run every pass.

use std::fmt;

use rules_core::config::{ValidationConfig, WorkflowDefinition};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::template::build_from_template;
use crate::validate::{
    validate_filter_types, validate_ignore_whitespace, validate_properties,
    validate_property_types, validate_rule_logic,
};

/// What a caller submits: either a template with parameters, or raw logic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logic: Option<Value>,
}

impl ProposalInput {
    pub fn from_template(template: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            template: Some(template.into()),
            params: Some(params),
            ..Self::default()
        }
    }

    pub fn from_logic(logic: Value) -> Self {
        Self {
            logic: Some(logic),
            ..Self::default()
        }
    }

    /// The template and its parameters, when both are given.
    pub fn template_request(&self) -> Option<(&str, &Map<String, Value>)> {
        match (self.template.as_deref(), self.params.as_ref()) {
            (Some(template), Some(params)) if !template.is_empty() => Some((template, params)),
            _ => None,
        }
    }

    pub fn has_logic_source(&self) -> bool {
        self.template_request().is_some() || self.logic.as_ref().is_some_and(is_truthy)
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

/// Category of a validation problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Build,
    Structure,
    Property,
    FilterType,
    Flag,
}

impl IssueKind {
    /// Prefix used when issues are flattened into one message.
    pub fn label(&self) -> &'static str {
        match self {
            IssueKind::Build | IssueKind::Structure => "Structure",
            IssueKind::Property => "Property",
            IssueKind::FilterType => "Filter",
            IssueKind::Flag => "Flag",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.label(), self.message)
    }
}

/// Combined verdict of every pass over one proposal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalValidation {
    pub valid: bool,
    /// Build failures are reported here too.
    pub structure_errors: Vec<String>,
    pub property_errors: Vec<String>,
    pub filter_errors: Vec<String>,
    pub filter_warnings: Vec<String>,
    pub flag_errors: Vec<String>,
    #[serde(skip)]
    build_failed: bool,
}

impl ProposalValidation {
    fn rejected_before_passes(errors: Vec<String>, build_failed: bool) -> Self {
        Self {
            valid: false,
            structure_errors: errors,
            build_failed,
            ..Self::default()
        }
    }

    /// Every error as a structured issue, in pass order. Warnings are excluded.
    pub fn issues(&self) -> Vec<Issue> {
        let structure_kind = if self.build_failed {
            IssueKind::Build
        } else {
            IssueKind::Structure
        };
        let groups = [
            (structure_kind, &self.structure_errors),
            (IssueKind::Property, &self.property_errors),
            (IssueKind::FilterType, &self.filter_errors),
            (IssueKind::Flag, &self.flag_errors),
        ];
        groups
            .into_iter()
            .flat_map(|(kind, messages)| {
                messages.iter().map(move |message| Issue {
                    kind,
                    message: message.clone(),
                })
            })
            .collect()
    }
}

/// Logic that passed validation, ready to compress.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedProposal {
    pub logic: Value,
    /// Carries the warnings of the passes that ran.
    pub validation: ProposalValidation,
}

fn resolve_logic(
    input: &ProposalInput,
    workflow: &WorkflowDefinition,
) -> Result<Value, ProposalValidation> {
    if let Some((template, params)) = input.template_request() {
        let built = build_from_template(template, params, workflow)
            .map_err(|err| ProposalValidation::rejected_before_passes(err.errors, true))?;
        return built.to_value().map_err(|err| {
            ProposalValidation::rejected_before_passes(vec![err.to_string()], true)
        });
    }

    match input.logic.as_ref().filter(|logic| is_truthy(logic)) {
        Some(logic) => Ok(logic.clone()),
        None => Err(ProposalValidation::rejected_before_passes(
            vec!["Either template+params or logic must be provided".to_string()],
            false,
        )),
    }
}

fn run_passes(logic: &Value, workflow: &WorkflowDefinition, config: &ValidationConfig) -> ProposalValidation {
    let structure = validate_rule_logic(logic, config);
    if !structure.valid {
        debug!(errors = structure.errors.len(), "structure pass failed");
        return ProposalValidation::rejected_before_passes(structure.errors, false);
    }

    let properties = validate_properties(logic, &workflow.object_type);
    let mut property_errors = properties.errors;
    if config.check_property_types {
        property_errors.extend(validate_property_types(logic, &workflow.object_type));
    }
    let filters = validate_filter_types(logic, config);
    let flags = validate_ignore_whitespace(logic, config);

    let valid = property_errors.is_empty() && filters.valid && flags.valid;
    debug!(
        valid,
        properties = properties.used_properties.len(),
        property_errors = property_errors.len(),
        filter_errors = filters.errors.len(),
        filter_warnings = filters.warnings.len(),
        "validation passes complete"
    );

    ProposalValidation {
        valid,
        structure_errors: structure.errors,
        property_errors,
        filter_errors: filters.errors,
        filter_warnings: filters.warnings,
        flag_errors: flags.errors,
        build_failed: false,
    }
}

/// Validates a proposal without submitting anything.
///
/// A template takes precedence over raw logic. When the structure pass
/// fails the property and filter passes are skipped.
pub fn validate_proposal(
    input: &ProposalInput,
    workflow: &WorkflowDefinition,
    config: &ValidationConfig,
) -> ProposalValidation {
    match resolve_logic(input, workflow) {
        Ok(logic) => run_passes(&logic, workflow, config),
        Err(rejected) => rejected,
    }
}

/// Validates a proposal and hands back its logic when it is valid.
pub fn prepare_proposal(
    input: &ProposalInput,
    workflow: &WorkflowDefinition,
    config: &ValidationConfig,
) -> Result<PreparedProposal, ProposalValidation> {
    let logic = resolve_logic(input, workflow)?;
    let validation = run_passes(&logic, workflow, config);
    if validation.valid {
        Ok(PreparedProposal { logic, validation })
    } else {
        Err(validation)
    }
}
