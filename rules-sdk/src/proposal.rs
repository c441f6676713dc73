use chrono::{DateTime, Utc};
use rules_core::config::ResolvedConfig;
use rules_logic::compression::compress;
use rules_logic::pipeline::{prepare_proposal, ProposalInput};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::api::ActionsApi;
use crate::error::ProposalError;

const FALLBACK_DESCRIPTION: &str = "Created via CLI";
const FALLBACK_KEYWORDS: &str = "cli-created";

/// A submitted proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProposalResult {
    pub proposal_id: String,
    pub rule_id: String,
    pub compressed_logic: String,
    /// Filter warnings raised while validating the logic.
    pub warnings: Vec<String>,
}

/// Outcome of approving or rejecting a single proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalOutcome {
    pub success: bool,
    pub proposal_id: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRejectResult {
    /// True when no rejection failed.
    pub success: bool,
    pub total: usize,
    pub rejected: usize,
    pub failed: usize,
    /// One entry per input id, in input order.
    pub results: Vec<ProposalOutcome>,
}

/// Changes to an existing proposal. Fields left as `None` are not sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditProposalInput {
    pub proposal_id: String,
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

impl EditProposalInput {
    pub fn new(proposal_id: impl Into<String>) -> Self {
        Self {
            proposal_id: proposal_id.into(),
            ..Self::default()
        }
    }

    fn logic_source(&self) -> ProposalInput {
        ProposalInput {
            template: self.template.clone(),
            params: self.params.clone(),
            logic: self.logic.clone(),
            ..ProposalInput::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditProposalResult {
    pub proposal_id: String,
    /// Present only when new logic was supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compressed_logic: Option<String>,
    pub message: String,
}

/// Drives the proposal lifecycle actions for one configured workflow.
pub struct ProposalService<A> {
    api: A,
    config: ResolvedConfig,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

fn text(value: impl Into<String>) -> Value {
    Value::String(value.into())
}

impl<A: ActionsApi> ProposalService<A> {
    pub fn new(api: A, config: ResolvedConfig) -> Self {
        Self { api, config }
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Validates, compresses and submits a new proposal.
    ///
    /// Nothing is sent when validation fails.
    pub async fn create(&self, input: &ProposalInput) -> Result<CreateProposalResult, ProposalError> {
        let prepared = prepare_proposal(input, &self.config.workflow, &self.config.validation)
            .map_err(|validation| ProposalError::Validation { validation })?;
        let compressed_logic = compress(&prepared.logic)?;

        let now = Utc::now();
        let timestamp = now.timestamp_millis();
        let conventions = &self.config.conventions;
        let proposal_id = format!("{}{}", conventions.proposal_id_prefix, timestamp);
        let rule_id = format!("{}{}", conventions.rule_id_prefix, timestamp);

        let name = non_empty(input.name.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Rule-{timestamp}"));
        let description = non_empty(input.description.as_deref())
            .or(non_empty(conventions.default_description.as_deref()))
            .unwrap_or(FALLBACK_DESCRIPTION);
        let keywords = non_empty(input.keywords.as_deref())
            .or(non_empty(conventions.default_keywords.as_deref()))
            .unwrap_or(FALLBACK_KEYWORDS);

        let mut parameters = Map::new();
        parameters.insert("proposal_id".into(), text(&proposal_id));
        parameters.insert("rule_id".into(), text(&rule_id));
        parameters.insert("new_rule_name".into(), text(name));
        parameters.insert("new_rule_description".into(), text(description));
        parameters.insert("new_logic".into(), text(&compressed_logic));
        parameters.insert("new_logic_keywords".into(), text(keywords));
        parameters.insert("proposal_author".into(), text(&conventions.default_author));
        parameters.insert("proposal_creation_timestamp".into(), timestamp_value(now));

        self.apply(&self.config.sdk.actions.create_proposal, parameters)
            .await?;
        info!(proposal_id = %proposal_id, rule_id = %rule_id, "proposal created");

        Ok(CreateProposalResult {
            proposal_id,
            rule_id,
            compressed_logic,
            warnings: prepared.validation.filter_warnings,
        })
    }

    /// Approves a proposal. The reviewer defaults to the configured author.
    pub async fn approve(
        &self,
        proposal_id: &str,
        rule_id: &str,
        reviewer: Option<&str>,
    ) -> Result<ProposalOutcome, ProposalError> {
        let mut parameters = self.review_parameters(proposal_id, reviewer);
        parameters.insert("rule_id".into(), text(rule_id));

        self.apply(&self.config.sdk.actions.approve_proposal, parameters)
            .await?;
        info!(proposal_id, "proposal approved");

        Ok(ProposalOutcome {
            success: true,
            proposal_id: proposal_id.to_string(),
            message: format!("Proposal {proposal_id} approved successfully"),
        })
    }

    /// Rejects a proposal. The reviewer defaults to the configured author.
    pub async fn reject(
        &self,
        proposal_id: &str,
        reviewer: Option<&str>,
    ) -> Result<ProposalOutcome, ProposalError> {
        let parameters = self.review_parameters(proposal_id, reviewer);

        self.apply(&self.config.sdk.actions.reject_proposal, parameters)
            .await?;
        info!(proposal_id, "proposal rejected");

        Ok(ProposalOutcome {
            success: true,
            proposal_id: proposal_id.to_string(),
            message: format!("Proposal {proposal_id} rejected successfully"),
        })
    }

    /// Rejects each proposal in order, continuing past failures.
    ///
    /// `reason` is recorded as the reviewer of every rejection.
    pub async fn bulk_reject(&self, proposal_ids: &[String], reason: Option<&str>) -> BulkRejectResult {
        let mut results = Vec::with_capacity(proposal_ids.len());
        let mut rejected = 0;

        for proposal_id in proposal_ids {
            match self.reject(proposal_id, reason).await {
                Ok(outcome) => {
                    rejected += 1;
                    results.push(outcome);
                }
                Err(err) => {
                    warn!(proposal_id = %proposal_id, error = %err, "bulk rejection failed");
                    results.push(ProposalOutcome {
                        success: false,
                        proposal_id: proposal_id.clone(),
                        message: format!("Failed to reject: {err}"),
                    });
                }
            }
        }

        let failed = proposal_ids.len() - rejected;
        BulkRejectResult {
            success: failed == 0,
            total: proposal_ids.len(),
            rejected,
            failed,
            results,
        }
    }

    /// Updates an existing proposal.
    ///
    /// Logic is validated and compressed only when raw logic or a template
    /// with parameters is given.
    pub async fn edit(&self, input: &EditProposalInput) -> Result<EditProposalResult, ProposalError> {
        let source = input.logic_source();
        let compressed_logic = if source.has_logic_source() {
            let prepared = prepare_proposal(&source, &self.config.workflow, &self.config.validation)
                .map_err(|validation| ProposalError::Validation { validation })?;
            Some(compress(&prepared.logic)?)
        } else {
            None
        };

        let mut parameters = Map::new();
        parameters.insert("proposal_object".into(), text(&input.proposal_id));
        parameters.insert("proposal_creation_timestamp".into(), timestamp_value(Utc::now()));
        parameters.insert(
            "proposal_author".into(),
            text(&self.config.conventions.default_author),
        );
        if let Some(name) = &input.name {
            parameters.insert("new_rule_name".into(), text(name));
        }
        if let Some(description) = &input.description {
            parameters.insert("new_rule_description".into(), text(description));
        }
        if let Some(keywords) = &input.keywords {
            parameters.insert("new_logic_keywords".into(), text(keywords));
        }
        if let Some(compressed) = &compressed_logic {
            parameters.insert("new_logic".into(), text(compressed));
        }

        self.apply(&self.config.sdk.actions.edit_proposal, parameters)
            .await?;
        info!(proposal_id = %input.proposal_id, logic_changed = compressed_logic.is_some(), "proposal edited");

        Ok(EditProposalResult {
            proposal_id: input.proposal_id.clone(),
            compressed_logic,
            message: format!("Proposal {} edited successfully", input.proposal_id),
        })
    }

    fn review_parameters(&self, proposal_id: &str, reviewer: Option<&str>) -> Map<String, Value> {
        let reviewer = non_empty(reviewer).unwrap_or(self.config.conventions.default_author.as_str());
        let mut parameters = Map::new();
        parameters.insert("proposal_object".into(), text(proposal_id));
        parameters.insert("proposal_review_timestamp".into(), timestamp_value(Utc::now()));
        parameters.insert("proposal_reviewer".into(), text(reviewer));
        parameters
    }

    async fn apply(&self, action: &str, parameters: Map<String, Value>) -> Result<Value, ProposalError> {
        debug!(action, parameters = parameters.len(), "applying action");
        self.api
            .apply_action(action, parameters)
            .await
            .map_err(|source| ProposalError::Action {
                action: action.to_string(),
                source,
            })
    }
}

fn timestamp_value(at: DateTime<Utc>) -> Value {
    text(at.to_rfc3339())
}
