use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// Applies a named platform action with the given parameters.
///
/// Timeouts, retries and cancellation belong to the implementation.
#[async_trait]
pub trait ActionsApi: Send + Sync {
    async fn apply_action(
        &self,
        action_api_name: &str,
        parameters: Map<String, Value>,
    ) -> Result<Value, ActionError>;
}

#[async_trait]
impl<A: ActionsApi + ?Sized> ActionsApi for Arc<A> {
    async fn apply_action(
        &self,
        action_api_name: &str,
        parameters: Map<String, Value>,
    ) -> Result<Value, ActionError> {
        (**self).apply_action(action_api_name, parameters).await
    }
}

/// Failure reported by an [`ActionsApi`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("action rejected by the platform: {0}")]
    Rejected(String),
    #[error("action request failed: {0}")]
    Transport(String),
    #[error("unexpected action response: {0}")]
    Decode(String),
}
