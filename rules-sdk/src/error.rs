use rules_logic::{CompressionError, ProposalValidation};
use thiserror::Error;

use crate::api::ActionError;

fn describe_validation(validation: &ProposalValidation) -> String {
    let lines: Vec<String> = validation
        .issues()
        .iter()
        .map(ToString::to_string)
        .collect();
    format!("Validation failed:\n{}", lines.join("\n"))
}

/// Errors returned by the proposal workflows.
#[derive(Debug, Error)]
pub enum ProposalError {
    #[error("{}", describe_validation(.validation))]
    Validation { validation: ProposalValidation },

    #[error(transparent)]
    Compression(#[from] CompressionError),

    #[error("action {action} failed: {source}")]
    Action {
        action: String,
        #[source]
        source: ActionError,
    },
}

impl ProposalError {
    pub fn validation(&self) -> Option<&ProposalValidation> {
        match self {
            ProposalError::Validation { validation } => Some(validation),
            _ => None,
        }
    }
}
