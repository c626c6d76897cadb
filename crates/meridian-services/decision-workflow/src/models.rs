use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The verdict an actor renders on a pending recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

/// An immutable approval record.
///
/// Exactly one is recorded per recommendation that leaves
/// PendingApproval; re-submission after rejection creates a new
/// recommendation, never a second decision on this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalDecision {
    pub recommendation_id: Uuid,
    pub decision: Decision,
    /// Human actor from the dashboard, or the auto-approve policy
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    pub rationale: Option<String>,
}

impl ApprovalDecision {
    pub fn new(
        recommendation_id: Uuid,
        decision: Decision,
        actor: impl Into<String>,
        rationale: Option<String>,
    ) -> Self {
        Self {
            recommendation_id,
            decision,
            actor: actor.into(),
            timestamp: Utc::now(),
            rationale,
        }
    }
}
