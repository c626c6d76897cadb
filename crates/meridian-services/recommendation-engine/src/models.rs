use chrono::{DateTime, Utc};
use meridian_types::Dimension;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The optimization action a recommendation proposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Stop,
    Schedule,
    Rightsize,
    Delete,
}

impl ActionType {
    /// Safety ordering used only to break ties at equal savings; lower is
    /// safer (stop < delete).
    pub fn risk_rank(self) -> u8 {
        match self {
            ActionType::Stop => 0,
            ActionType::Schedule => 1,
            ActionType::Rightsize => 2,
            ActionType::Delete => 3,
        }
    }

    /// Whether a compensating inverse operation exists for this action
    pub fn has_inverse(self) -> bool {
        !matches!(self, ActionType::Delete)
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Stop => write!(f, "stop"),
            ActionType::Schedule => write!(f, "schedule"),
            ActionType::Rightsize => write!(f, "rightsize"),
            ActionType::Delete => write!(f, "delete"),
        }
    }
}

/// Lifecycle state of a recommendation.
///
/// Transitions form a fixed table; everything outside it is rejected with
/// `InvalidTransition`. Rejected, Failed, and RolledBack are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecommendationStatus {
    Proposed,
    PendingApproval,
    Approved,
    Rejected,
    Executing,
    Completed,
    Failed,
    RolledBack,
}

impl RecommendationStatus {
    /// The complete transition table of the approval workflow
    pub fn can_transition(from: RecommendationStatus, to: RecommendationStatus) -> bool {
        use RecommendationStatus::*;
        matches!(
            (from, to),
            (Proposed, PendingApproval)
                | (PendingApproval, Approved)
                | (PendingApproval, Rejected)
                | (PendingApproval, Proposed)
                | (Approved, Executing)
                | (Executing, Completed)
                | (Executing, Failed)
                | (Completed, RolledBack)
        )
    }

    /// Legal successor states
    pub fn valid_targets(self) -> Vec<RecommendationStatus> {
        use RecommendationStatus::*;
        [
            Proposed,
            PendingApproval,
            Approved,
            Rejected,
            Executing,
            Completed,
            Failed,
            RolledBack,
        ]
        .into_iter()
        .filter(|&to| Self::can_transition(self, to))
        .collect()
    }

    /// Whether this state admits no further transitions
    pub fn is_terminal(self) -> bool {
        self.valid_targets().is_empty()
    }
}

impl std::str::FromStr for RecommendationStatus {
    type Err = meridian_error::MeridianError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Proposed" => Ok(RecommendationStatus::Proposed),
            "PendingApproval" => Ok(RecommendationStatus::PendingApproval),
            "Approved" => Ok(RecommendationStatus::Approved),
            "Rejected" => Ok(RecommendationStatus::Rejected),
            "Executing" => Ok(RecommendationStatus::Executing),
            "Completed" => Ok(RecommendationStatus::Completed),
            "Failed" => Ok(RecommendationStatus::Failed),
            "RolledBack" => Ok(RecommendationStatus::RolledBack),
            _ => Err(meridian_error::MeridianError::invalid_input(
                "status",
                format!("unrecognized status: {}", s),
            )),
        }
    }
}

impl std::fmt::Display for RecommendationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RecommendationStatus::Proposed => "Proposed",
            RecommendationStatus::PendingApproval => "PendingApproval",
            RecommendationStatus::Approved => "Approved",
            RecommendationStatus::Rejected => "Rejected",
            RecommendationStatus::Executing => "Executing",
            RecommendationStatus::Completed => "Completed",
            RecommendationStatus::Failed => "Failed",
            RecommendationStatus::RolledBack => "RolledBack",
        };
        write!(f, "{}", name)
    }
}

/// Reference to the signal a recommendation is grounded on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EvidenceRef {
    Anomaly {
        event_id: Uuid,
        detected_at: DateTime<Utc>,
    },
    Forecast {
        dimension: Dimension,
        generated_at: DateTime<Utc>,
    },
    Utilization {
        resource_id: String,
        observed_at: DateTime<Utc>,
    },
}

impl EvidenceRef {
    /// When the underlying signal was produced, for staleness checks
    pub fn produced_at(&self) -> DateTime<Utc> {
        match self {
            EvidenceRef::Anomaly { detected_at, .. } => *detected_at,
            EvidenceRef::Forecast { generated_at, .. } => *generated_at,
            EvidenceRef::Utilization { observed_at, .. } => *observed_at,
        }
    }
}

/// A rule's raw output before tie-breaking and id assignment
#[derive(Debug, Clone)]
pub struct RecommendationDraft {
    pub resource_id: String,
    pub action_type: ActionType,
    pub estimated_monthly_savings: Decimal,
    pub confidence: f64,
    pub evidence: Vec<EvidenceRef>,
    pub description: String,
}

/// A ranked, costed optimization recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: Uuid,
    pub resource_id: String,
    pub action_type: ActionType,
    pub estimated_monthly_savings: Decimal,
    /// 0..=1 confidence in the savings estimate
    pub confidence: f64,
    pub evidence: Vec<EvidenceRef>,
    pub status: RecommendationStatus,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Recommendation {
    pub fn from_draft(draft: RecommendationDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            resource_id: draft.resource_id,
            action_type: draft.action_type,
            estimated_monthly_savings: draft.estimated_monthly_savings,
            confidence: draft.confidence,
            evidence: draft.evidence,
            status: RecommendationStatus::Proposed,
            description: draft.description,
            created_at: Utc::now(),
        }
    }
}
