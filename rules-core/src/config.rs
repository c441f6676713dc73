//! Workflow configuration model and its resolution step.
//!
//! [`WorkflowConfig`] mirrors the config file as written. Calling
//! [`WorkflowConfig::resolve`] substitutes environment references and reads
//! the API token, producing an immutable [`ResolvedConfig`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::resolver::{resolve_env_vars, EnvSource};
use crate::secret::Secret;

/// Declared type of an object property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    String,
    Number,
    Boolean,
    Date,
    Timestamp,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::String => "string",
            PropertyType::Number => "number",
            PropertyType::Boolean => "boolean",
            PropertyType::Date => "date",
            PropertyType::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub id: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectTypeConfig {
    pub id: String,
    #[serde(default)]
    pub dynamic_lookup: bool,
    #[serde(default)]
    pub properties: Vec<PropertyDefinition>,
}

impl ObjectTypeConfig {
    /// Declared property ids in declaration order.
    pub fn property_ids(&self) -> Vec<&str> {
        self.properties.iter().map(|p| p.id.as_str()).collect()
    }

    pub fn property(&self, id: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputParameterConfig {
    pub id: String,
    #[serde(rename = "type")]
    pub parameter_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub id: String,
    pub version: String,
    #[serde(default)]
    pub parameters: Vec<OutputParameterConfig>,
}

/// The workflow a rule belongs to: its object type schema and output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDefinition {
    pub name: String,
    pub workflow_rid: String,
    pub object_type: ObjectTypeConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoundryConnection {
    pub url: String,
    pub ontology_rid: String,
    pub token_env_var: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchetypeConfig {
    pub proposal: String,
    pub rule: String,
}

/// Action API names used by the proposal workflows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionConfig {
    pub create_proposal: String,
    pub approve_proposal: String,
    pub reject_proposal: String,
    pub edit_proposal: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkConfig {
    pub package_name: String,
    pub archetypes: ArchetypeConfig,
    pub actions: ActionConfig,
}

/// Operator and strategy allow/deny lists driving the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationConfig {
    pub grammar_version: String,
    pub supported_strategy_types: Vec<String>,
    pub supported_string_filters: Vec<String>,
    #[serde(default)]
    pub unsupported_string_filters: Vec<String>,
    #[serde(default)]
    pub supported_numeric_filters: Vec<String>,
    #[serde(default)]
    pub supported_null_filters: Vec<String>,
    /// String operators whose leaves must set `ignoreWhitespace: true`.
    #[serde(default)]
    pub require_ignore_whitespace: Vec<String>,
    /// Reject comparisons whose kind does not fit the declared property type.
    #[serde(default)]
    pub check_property_types: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConventionConfig {
    pub proposal_id_prefix: String,
    pub rule_id_prefix: String,
    pub default_author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_keywords: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

/// Workflow configuration exactly as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub version: String,
    pub workflow: WorkflowDefinition,
    pub foundry: FoundryConnection,
    pub sdk: SdkConfig,
    pub validation: ValidationConfig,
    pub conventions: ConventionConfig,
    #[serde(default)]
    pub templates: Vec<TemplateConfig>,
}

impl WorkflowConfig {
    /// Substitutes `${VAR}` references in the connection settings and reads
    /// the token from `env`.
    ///
    /// Unknown variables are errors. An unset token is only reported as a
    /// warning, and only when `validate_token` is set.
    pub fn resolve<E: EnvSource + ?Sized>(
        self,
        env: &E,
        validate_token: bool,
    ) -> Result<LoadedConfig, ConfigError> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let url = resolve_env_vars(&self.foundry.url, env);
        if !url.missing.is_empty() {
            errors.push(format!(
                "Missing environment variable for foundry.url: {}",
                url.missing.join(", ")
            ));
        }
        let ontology = resolve_env_vars(&self.foundry.ontology_rid, env);
        if !ontology.missing.is_empty() {
            errors.push(format!(
                "Missing environment variable for foundry.ontologyRid: {}",
                ontology.missing.join(", ")
            ));
        }

        let token = Secret::new(env.var(&self.foundry.token_env_var).unwrap_or_default());
        if validate_token && token.is_empty() {
            warnings.push(format!(
                "Token environment variable not set: {}",
                self.foundry.token_env_var
            ));
        }

        if !errors.is_empty() {
            return Err(ConfigError::Unresolved { errors });
        }

        let config = ResolvedConfig {
            version: self.version,
            workflow: self.workflow,
            foundry: ResolvedFoundryConnection {
                url: url.value,
                ontology_rid: ontology.value,
                token,
            },
            sdk: self.sdk,
            validation: self.validation,
            conventions: self.conventions,
            templates: self.templates,
        };
        Ok(LoadedConfig { config, warnings })
    }
}

/// Connection settings with references substituted and the token read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFoundryConnection {
    pub url: String,
    pub ontology_rid: String,
    pub token: Secret,
}

/// Fully resolved configuration. Nothing in it refers to the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub version: String,
    pub workflow: WorkflowDefinition,
    pub foundry: ResolvedFoundryConnection,
    pub sdk: SdkConfig,
    pub validation: ValidationConfig,
    pub conventions: ConventionConfig,
    pub templates: Vec<TemplateConfig>,
}

/// A resolved configuration plus the non-fatal problems found on the way.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: ResolvedConfig,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn raw() -> serde_json::Value {
        serde_json::json!({
            "version": "1.0",
            "workflow": {
                "name": "test-workflow",
                "workflowRid": "ri.taurus.main.workflow.test",
                "objectType": {
                    "id": "test-object",
                    "properties": [
                        {"id": "name", "type": "string"},
                        {"id": "amount", "type": "number", "nullable": true}
                    ]
                },
                "output": {"id": "out-1", "version": "1"}
            },
            "foundry": {
                "url": "https://${FOUNDRY_HOST}",
                "ontologyRid": "ri.ontology.main.ontology.test",
                "tokenEnvVar": "FOUNDRY_TOKEN"
            },
            "sdk": {
                "packageName": "sdk",
                "archetypes": {"proposal": "Proposal", "rule": "Rule"},
                "actions": {
                    "createProposal": "create-proposal",
                    "approveProposal": "approve-proposal",
                    "rejectProposal": "reject-proposal",
                    "editProposal": "edit-proposal"
                }
            },
            "validation": {
                "grammarVersion": "V1",
                "supportedStrategyTypes": ["filterNode"],
                "supportedStringFilters": ["EQUALS"]
            },
            "conventions": {
                "proposalIdPrefix": "proposal-",
                "ruleIdPrefix": "rule-",
                "defaultAuthor": "tester"
            }
        })
    }

    fn parse() -> WorkflowConfig {
        serde_json::from_value(raw()).expect("config parses")
    }

    #[test]
    fn parses_with_defaults() {
        let config = parse();
        assert!(!config.workflow.object_type.dynamic_lookup);
        assert_eq!(
            config.workflow.object_type.property_ids(),
            vec!["name", "amount"]
        );
        assert_eq!(
            config.workflow.object_type.property("amount").map(|p| p.property_type),
            Some(PropertyType::Number)
        );
        assert!(config.validation.unsupported_string_filters.is_empty());
        assert!(config.validation.require_ignore_whitespace.is_empty());
        assert!(!config.validation.check_property_types);
        assert!(config.templates.is_empty());
    }

    #[test]
    fn rejects_unknown_property_types() {
        let mut value = raw();
        value["workflow"]["objectType"]["properties"][0]["type"] = "blob".into();
        assert!(serde_json::from_value::<WorkflowConfig>(value).is_err());
    }

    #[test]
    fn resolves_references_and_token() {
        let env: HashMap<String, String> = [
            ("FOUNDRY_HOST".to_string(), "example.com".to_string()),
            ("FOUNDRY_TOKEN".to_string(), "tok en\n".to_string()),
        ]
        .into_iter()
        .collect();

        let loaded = parse().resolve(&env, true).expect("resolves");
        assert_eq!(loaded.config.foundry.url, "https://example.com");
        assert_eq!(loaded.config.foundry.token.expose(), "token");
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn missing_reference_is_an_error() {
        let env: HashMap<String, String> = HashMap::new();
        let err = parse().resolve(&env, true).expect_err("must fail");
        assert_eq!(
            err.messages(),
            vec!["Missing environment variable for foundry.url: FOUNDRY_HOST".to_string()]
        );
    }

    #[test]
    fn missing_token_is_a_warning_only_when_requested() {
        let env: HashMap<String, String> =
            [("FOUNDRY_HOST".to_string(), "h".to_string())].into_iter().collect();

        let checked = parse().resolve(&env, true).expect("resolves");
        assert_eq!(
            checked.warnings,
            vec!["Token environment variable not set: FOUNDRY_TOKEN".to_string()]
        );

        let unchecked = parse().resolve(&env, false).expect("resolves");
        assert!(unchecked.warnings.is_empty());
        assert!(unchecked.config.foundry.token.is_empty());
    }
}
