use std::collections::HashMap;
use std::fs;

use anyhow::Context;
use foundry_rules::logic::extract::{filter_summary, logic_properties};
use foundry_rules::logic::IssueKind;
use foundry_rules::{
    build_from_template, compress, compression_stats, decompress, load_config, validate_proposal,
    ConfigError, LoadOptions, ProposalInput, GRAMMAR_VERSION,
};
use serde_json::{json, Map, Value};
use tempfile::TempDir;

fn config_json() -> Value {
    json!({
        "version": "1.0",
        "workflow": {
            "name": "invoice-review",
            "workflowRid": "ri.taurus.main.workflow.invoices",
            "objectType": {
                "id": "invoice",
                "properties": [
                    {"id": "status", "type": "string"},
                    {"id": "region", "type": "string"},
                    {"id": "amount", "type": "number"},
                    {"id": "approvedAt", "type": "date", "nullable": true}
                ]
            },
            "output": {"id": "flagged-invoices", "version": "4"}
        },
        "foundry": {
            "url": "https://${FOUNDRY_HOST}",
            "ontologyRid": "ri.ontology.main.ontology.invoices",
            "tokenEnvVar": "FOUNDRY_TOKEN"
        },
        "sdk": {
            "packageName": "invoice-sdk",
            "archetypes": {"proposal": "RuleProposal", "rule": "Rule"},
            "actions": {
                "createProposal": "create-rule-proposal",
                "approveProposal": "approve-rule-proposal",
                "rejectProposal": "reject-rule-proposal",
                "editProposal": "edit-rule-proposal"
            }
        },
        "validation": {
            "grammarVersion": "V1",
            "supportedStrategyTypes": ["filterNode"],
            "supportedStringFilters": ["EQUALS", "CONTAINS"],
            "unsupportedStringFilters": ["REGEX"],
            "supportedNumericFilters": ["GREATER_THAN_OR_EQUAL", "LESS_THAN_OR_EQUAL"],
            "supportedNullFilters": ["NULL", "NOT_NULL"]
        },
        "conventions": {
            "proposalIdPrefix": "proposal-",
            "ruleIdPrefix": "rule-",
            "defaultAuthor": "rules-bot"
        },
        "templates": [
            {"name": "open-invoices", "file": "templates/open.json"}
        ]
    })
}

fn env() -> HashMap<String, String> {
    [
        ("FOUNDRY_HOST", "foundry.example.com"),
        ("FOUNDRY_TOKEN", "tok-123"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn write_config(dir: &TempDir) -> anyhow::Result<std::path::PathBuf> {
    let path = dir.path().join("workflow.json");
    fs::write(&path, serde_json::to_string_pretty(&config_json())?)?;
    Ok(path)
}

fn params(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

#[test]
fn loaded_config_drives_build_validate_and_compress() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let loaded = load_config(write_config(&dir)?, &LoadOptions::default(), &env())?;
    assert!(loaded.warnings.is_empty());

    let config = loaded.config;
    assert_eq!(config.foundry.url, "https://foundry.example.com");
    assert_eq!(config.foundry.token.expose(), "tok-123");
    assert!(!format!("{config:?}").contains("tok-123"));
    let template_file = config.templates[0].file.as_deref().context("template file")?;
    assert!(template_file.starts_with(&*dir.path().to_string_lossy()));

    let input = ProposalInput::from_template(
        "string-or",
        params(json!({"propertyId": "region", "values": ["north", "south"]})),
    );
    let validation = validate_proposal(&input, &config.workflow, &config.validation);
    assert!(validation.valid, "{:?}", validation.issues());

    let built = build_from_template(
        "string-or",
        input.params.as_ref().context("params")?,
        &config.workflow,
    )?;
    let logic = built.to_value()?;
    assert_eq!(logic["grammarVersion"], GRAMMAR_VERSION);
    assert_eq!(logic_properties(&logic), vec!["region"]);
    assert!(filter_summary(&logic).has_compound_filters);

    let wrapper = compress(&logic)?;
    assert_eq!(decompress(&wrapper)?, logic);
    let stats = compression_stats(&logic)?;
    assert!(stats.original_size > 0);
    Ok(())
}

#[test]
fn edited_logic_reports_every_failing_pass() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let config = load_config(write_config(&dir)?, &LoadOptions::default(), &env())?.config;

    let built = build_from_template(
        "string-equals",
        &params(json!({"propertyId": "status", "value": "open"})),
        &config.workflow,
    )?;
    let mut logic = built.to_value()?;
    let rule = &mut logic["strategy"]["filterNode"]["filter"]["columnFilterRule"];
    rule["column"]["objectProperty"]["propertyTypeId"] = json!("ghost");
    rule["filter"]["stringColumnFilter"]["type"] = json!("REGEX");

    let validation = validate_proposal(
        &ProposalInput::from_logic(logic),
        &config.workflow,
        &config.validation,
    );
    assert!(!validation.valid);
    assert!(validation.property_errors[0].contains("ghost"));
    assert!(validation.property_errors[0].contains("does not exist"));
    assert!(validation.filter_errors[0].contains("REGEX"));
    assert!(validation.filter_errors[0].contains("not supported"));

    let kinds: Vec<IssueKind> = validation.issues().iter().map(|issue| issue.kind).collect();
    assert_eq!(kinds, vec![IssueKind::Property, IssueKind::FilterType]);
    Ok(())
}

#[test]
fn missing_builder_parameters_are_reported_together() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let config = load_config(write_config(&dir)?, &LoadOptions::default(), &env())?.config;

    let err = build_from_template("string-equals", &params(json!({"value": "test"})), &config.workflow)
        .expect_err("propertyId is required");
    assert_eq!(err.messages(), ["Missing required parameter: propertyId"]);
    Ok(())
}

#[test]
fn unresolved_references_fail_and_missing_token_warns() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = write_config(&dir)?;

    let empty: HashMap<String, String> = HashMap::new();
    let err = load_config(&path, &LoadOptions::default(), &empty).expect_err("host is unset");
    assert!(matches!(err, ConfigError::Unresolved { .. }));
    assert!(err
        .to_string()
        .contains("Missing environment variable for foundry.url: FOUNDRY_HOST"));

    let mut host_only = env();
    host_only.remove("FOUNDRY_TOKEN");
    let loaded = load_config(&path, &LoadOptions::default(), &host_only)?;
    assert_eq!(loaded.warnings, ["Token environment variable not set: FOUNDRY_TOKEN"]);
    assert!(load_config(&path, &LoadOptions::syntax_only(), &host_only)?
        .warnings
        .is_empty());
    Ok(())
}
