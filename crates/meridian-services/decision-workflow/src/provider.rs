use async_trait::async_trait;
use recommendation_engine::ActionType;
use serde::{Deserialize, Serialize};

use crate::{MeridianError, Result};

/// Forward or compensating form of an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionCommand {
    /// Apply the recommended action
    Apply(ActionType),
    /// Apply the inverse of a previously completed action
    Revert(ActionType),
}

impl ActionCommand {
    /// The compensating command for a completed action, when one exists
    pub fn revert_of(action: ActionType) -> Result<Self> {
        if !action.has_inverse() {
            return Err(MeridianError::irreversible_action(action.to_string()));
        }
        Ok(ActionCommand::Revert(action))
    }
}

impl std::fmt::Display for ActionCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionCommand::Apply(action) => write!(f, "apply:{}", action),
            ActionCommand::Revert(action) => write!(f, "revert:{}", action),
        }
    }
}

/// One invocation against the provider automation boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequest {
    pub command: ActionCommand,
    pub resource_id: String,
    pub parameters: serde_json::Value,
}

/// Provider-native identifiers returned by a successful invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderReceipt {
    pub provider_ref: String,
}

/// Actual resource state as the provider reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderResourceState {
    pub exists: bool,
    pub running: bool,
}

impl ProviderResourceState {
    /// Whether this state confirms the given command already took effect.
    ///
    /// Provider calls are not idempotent by default; a retry is allowed
    /// only when the prior attempt verifiably did not apply. `None` means
    /// the state cannot confirm either way, and the caller must not
    /// retry blindly.
    pub fn confirms(&self, command: ActionCommand) -> Option<bool> {
        match command {
            ActionCommand::Apply(ActionType::Stop) => Some(self.exists && !self.running),
            ActionCommand::Apply(ActionType::Delete) => Some(!self.exists),
            ActionCommand::Revert(ActionType::Stop) => Some(self.exists && self.running),
            _ => None,
        }
    }
}

/// Cloud provider automation interface (external collaborator).
///
/// Calls are subject to the workflow's timeout and are never assumed
/// idempotent.
#[async_trait]
pub trait CloudAutomation: Send + Sync {
    /// Invoke an action; returns the provider-native receipt on success
    async fn execute(&self, request: &ActionRequest) -> Result<ProviderReceipt>;

    /// Query the actual state of a resource
    async fn query_state(&self, resource_id: &str) -> Result<ProviderResourceState>;
}
