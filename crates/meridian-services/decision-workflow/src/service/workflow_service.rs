use std::str::FromStr;
use std::sync::Arc;

use audit_ledger::AuditLedger;
use chrono::Utc;
use dashmap::DashMap;
use recommendation_engine::{Recommendation, RecommendationStatus};
use resource_inventory::{InventoryStore, ResourceState};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::WorkflowConfig;
use crate::locks::ResourceLockManager;
use crate::models::{ApprovalDecision, Decision};
use crate::provider::{ActionCommand, ActionRequest, CloudAutomation, ProviderReceipt};
use crate::{MeridianError, Result};

/// Ledger partition all workflow transitions land in
const PARTITION: &str = "workflow";
const ENTITY_TYPE: &str = "recommendation";

/// Actor recorded for engine-driven transitions
const ACTOR_ENGINE: &str = "decision-engine";
const ACTOR_AUTO_APPROVE: &str = "auto-approve-policy";
const ACTOR_RECONCILER: &str = "crash-reconciler";

/// Drives recommendations through the approval state machine and
/// executes approved actions against the provider boundary.
///
/// Every transition is validated against the table in
/// [`RecommendationStatus::can_transition`] and written to the audit
/// ledger before the in-memory state changes (write-ahead).
pub struct WorkflowService {
    config: WorkflowConfig,
    recommendations: DashMap<Uuid, Recommendation>,
    decisions: DashMap<Uuid, ApprovalDecision>,
    ledger: Arc<AuditLedger>,
    locks: ResourceLockManager,
    provider: Arc<dyn CloudAutomation>,
    inventory: Arc<InventoryStore>,
}

impl WorkflowService {
    pub fn new(
        config: WorkflowConfig,
        ledger: Arc<AuditLedger>,
        provider: Arc<dyn CloudAutomation>,
        inventory: Arc<InventoryStore>,
    ) -> Self {
        Self {
            config,
            recommendations: DashMap::new(),
            decisions: DashMap::new(),
            ledger,
            locks: ResourceLockManager::new(),
            provider,
            inventory,
        }
    }

    /// Take ownership of a freshly proposed recommendation
    pub fn admit(&self, recommendation: Recommendation) -> Result<Uuid> {
        if recommendation.status != RecommendationStatus::Proposed {
            return Err(MeridianError::invalid_input(
                "status",
                format!(
                    "only Proposed recommendations can be admitted, got {}",
                    recommendation.status
                ),
            ));
        }
        let id = recommendation.id;
        self.recommendations.insert(id, recommendation);
        Ok(id)
    }

    /// Re-admit recommendations after a restart, deriving each status
    /// from its audit trail instead of trusting the caller.
    pub fn hydrate(&self, recommendations: Vec<Recommendation>) -> Result<()> {
        for mut recommendation in recommendations {
            if let Some(last) = self
                .ledger
                .last_for_entity(PARTITION, &recommendation.id.to_string())
            {
                recommendation.status = RecommendationStatus::from_str(&last.to_state)?;
            }
            self.recommendations.insert(recommendation.id, recommendation);
        }
        Ok(())
    }

    /// Current snapshot of a recommendation
    pub fn get(&self, id: Uuid) -> Result<Recommendation> {
        self.recommendations
            .get(&id)
            .map(|r| r.clone())
            .ok_or_else(|| MeridianError::not_found("recommendation", id.to_string()))
    }

    /// Current status of a recommendation
    pub fn status(&self, id: Uuid) -> Result<RecommendationStatus> {
        Ok(self.get(id)?.status)
    }

    /// The approval decision recorded for a recommendation, if any
    pub fn decision(&self, id: Uuid) -> Option<ApprovalDecision> {
        self.decisions.get(&id).map(|d| d.clone())
    }

    /// Whether a resource already has a recommendation that is still in
    /// flight (not terminal and not completed). Used to keep evaluation
    /// cycles from piling duplicates onto one resource.
    pub fn has_active_for_resource(&self, resource_id: &str) -> bool {
        self.recommendations.iter().any(|r| {
            r.resource_id == resource_id
                && !r.status.is_terminal()
                && r.status != RecommendationStatus::Completed
        })
    }

    /// All recommendations currently in a given status
    pub fn in_status(&self, status: RecommendationStatus) -> Vec<Recommendation> {
        self.recommendations
            .iter()
            .filter(|r| r.status == status)
            .map(|r| r.clone())
            .collect()
    }

    /// Validated transition with write-ahead audit.
    ///
    /// The ledger append happens while the recommendation entry is held
    /// exclusively; a failed append leaves the state untouched and is
    /// fatal to the run.
    fn transition(
        &self,
        id: Uuid,
        to: RecommendationStatus,
        actor: &str,
    ) -> Result<RecommendationStatus> {
        let mut entry = self
            .recommendations
            .get_mut(&id)
            .ok_or_else(|| MeridianError::not_found("recommendation", id.to_string()))?;
        let from = entry.status;
        if !RecommendationStatus::can_transition(from, to) {
            return Err(MeridianError::invalid_transition(
                from.to_string(),
                to.to_string(),
            ));
        }
        self.ledger.append(
            PARTITION,
            ENTITY_TYPE,
            &id.to_string(),
            &from.to_string(),
            &to.to_string(),
            actor,
        )?;
        entry.status = to;
        info!(recommendation_id = %id, %from, %to, actor, "workflow transition");
        Ok(to)
    }

    /// Evidence must exist and must not be stale beyond the configured age
    fn validate_evidence(&self, recommendation: &Recommendation) -> Result<()> {
        if recommendation.evidence.is_empty() {
            return Err(MeridianError::evidence_stale(
                recommendation.id.to_string(),
                "no supporting evidence",
            ));
        }
        let oldest_allowed = Utc::now() - self.config.evidence_max_age();
        for evidence in &recommendation.evidence {
            if evidence.produced_at() < oldest_allowed {
                return Err(MeridianError::evidence_stale(
                    recommendation.id.to_string(),
                    format!(
                        "evidence from {} is older than {}s",
                        evidence.produced_at(),
                        self.config.evidence_max_age_secs
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Move a proposed recommendation into the approval stage.
    ///
    /// Evidence validation gates the automatic Proposed to
    /// PendingApproval transition; failures leave the recommendation in
    /// Proposed for re-evaluation. A recommendation whose savings sit at
    /// or under the auto-approve cap passes straight through a logged
    /// Approved transition, never skipping the state.
    pub fn submit(&self, id: Uuid) -> Result<RecommendationStatus> {
        let recommendation = self.get(id)?;
        if recommendation.status != RecommendationStatus::Proposed {
            return Err(MeridianError::invalid_transition(
                recommendation.status.to_string(),
                RecommendationStatus::PendingApproval.to_string(),
            ));
        }
        self.validate_evidence(&recommendation)?;
        self.transition(id, RecommendationStatus::PendingApproval, ACTOR_ENGINE)?;

        if recommendation.estimated_monthly_savings <= self.config.auto_approve_cap {
            self.decisions.insert(
                id,
                ApprovalDecision::new(
                    id,
                    Decision::Approve,
                    ACTOR_AUTO_APPROVE,
                    Some(format!(
                        "savings {} at or under auto-approve cap {}",
                        recommendation.estimated_monthly_savings, self.config.auto_approve_cap
                    )),
                ),
            );
            return self.transition(id, RecommendationStatus::Approved, ACTOR_AUTO_APPROVE);
        }
        Ok(RecommendationStatus::PendingApproval)
    }

    /// Record an external actor's decision on a pending recommendation
    pub fn decide(
        &self,
        id: Uuid,
        decision: Decision,
        actor: &str,
        rationale: Option<String>,
    ) -> Result<RecommendationStatus> {
        if self.status(id)? != RecommendationStatus::PendingApproval {
            return Err(MeridianError::invalid_transition(
                self.status(id)?.to_string(),
                "Approved/Rejected".to_string(),
            ));
        }
        let target = match decision {
            Decision::Approve => RecommendationStatus::Approved,
            Decision::Reject => RecommendationStatus::Rejected,
        };
        let status = self.transition(id, target, actor)?;
        self.decisions
            .insert(id, ApprovalDecision::new(id, decision, actor, rationale));
        Ok(status)
    }

    /// Withdraw a pending recommendation before execution, without side
    /// effects. Once Executing, cancellation is not honored.
    pub fn withdraw(&self, id: Uuid, actor: &str) -> Result<()> {
        if self.status(id)? != RecommendationStatus::PendingApproval {
            return Err(MeridianError::invalid_transition(
                self.status(id)?.to_string(),
                RecommendationStatus::Rejected.to_string(),
            ));
        }
        self.transition(id, RecommendationStatus::Rejected, actor)?;
        self.decisions.insert(
            id,
            ApprovalDecision::new(id, Decision::Reject, actor, Some("withdrawn".to_string())),
        );
        Ok(())
    }

    /// Execute an approved recommendation under the resource's exclusive
    /// lock.
    ///
    /// The Executing ledger entry happens-before the provider call; the
    /// terminal entry happens-after it returns. A lock timeout leaves the
    /// recommendation Approved for a later retry, never dropped.
    pub async fn execute(&self, id: Uuid) -> Result<RecommendationStatus> {
        let recommendation = self.get(id)?;
        if recommendation.status != RecommendationStatus::Approved {
            return Err(MeridianError::invalid_transition(
                recommendation.status.to_string(),
                RecommendationStatus::Executing.to_string(),
            ));
        }

        let _guard = self
            .locks
            .acquire(&recommendation.resource_id, self.config.lock_timeout())
            .await?;

        // Somebody else may have driven this recommendation while we
        // waited on the lock
        if self.status(id)? != RecommendationStatus::Approved {
            return Err(MeridianError::invalid_transition(
                self.status(id)?.to_string(),
                RecommendationStatus::Executing.to_string(),
            ));
        }

        self.transition(id, RecommendationStatus::Executing, ACTOR_ENGINE)?;

        let request = ActionRequest {
            command: ActionCommand::Apply(recommendation.action_type),
            resource_id: recommendation.resource_id.clone(),
            parameters: serde_json::json!({}),
        };

        match self.run_with_retries(&request).await {
            Ok(receipt) => {
                self.transition(id, RecommendationStatus::Completed, ACTOR_ENGINE)?;
                info!(
                    recommendation_id = %id,
                    provider_ref = %receipt.provider_ref,
                    "action completed"
                );
                self.apply_inventory_effect(&recommendation.resource_id, request.command);
                Ok(RecommendationStatus::Completed)
            }
            Err(error) => {
                warn!(recommendation_id = %id, %error, "action failed after retries");
                self.transition(id, RecommendationStatus::Failed, ACTOR_ENGINE)?;
                Ok(RecommendationStatus::Failed)
            }
        }
    }

    /// Invoke the provider with bounded, backoff-spaced retries.
    ///
    /// Provider calls are not idempotent: each retry is preceded by a
    /// state query confirming the prior attempt did not already apply.
    /// When the query cannot confirm either way, the attempt is not
    /// retried and the failure surfaces for manual review.
    async fn run_with_retries(&self, request: &ActionRequest) -> Result<ProviderReceipt> {
        let mut attempt: u32 = 1;
        loop {
            let outcome = tokio::time::timeout(
                self.config.provider_call_timeout(),
                self.provider.execute(request),
            )
            .await;

            let error = match outcome {
                Ok(Ok(receipt)) => return Ok(receipt),
                Ok(Err(error)) => error,
                Err(_) => MeridianError::provider_call_failed(
                    request.command.to_string(),
                    "provider call timed out",
                ),
            };
            if !error.is_retriable() || attempt >= self.config.max_attempts {
                return Err(error);
            }

            warn!(
                command = %request.command,
                resource_id = %request.resource_id,
                attempt,
                %error,
                "provider call failed, backing off"
            );
            tokio::time::sleep(self.config.backoff_for_attempt(attempt)).await;

            let state = self.provider.query_state(&request.resource_id).await?;
            match state.confirms(request.command) {
                Some(true) => {
                    // The failed attempt actually applied
                    return Ok(ProviderReceipt {
                        provider_ref: "confirmed-by-state-query".to_string(),
                    });
                }
                Some(false) => {
                    attempt += 1;
                }
                None => {
                    return Err(MeridianError::provider_call_failed(
                        request.command.to_string(),
                        "outcome indeterminate after failure; not retrying",
                    ));
                }
            }
        }
    }

    /// Request the compensating action for a completed recommendation.
    ///
    /// Re-acquires the same exclusive lock; action types without an
    /// inverse are rejected before touching the provider.
    pub async fn rollback(&self, id: Uuid, actor: &str) -> Result<RecommendationStatus> {
        let recommendation = self.get(id)?;
        if recommendation.status != RecommendationStatus::Completed {
            return Err(MeridianError::invalid_transition(
                recommendation.status.to_string(),
                RecommendationStatus::RolledBack.to_string(),
            ));
        }
        let command = ActionCommand::revert_of(recommendation.action_type)?;

        let _guard = self
            .locks
            .acquire(&recommendation.resource_id, self.config.lock_timeout())
            .await?;

        if self.status(id)? != RecommendationStatus::Completed {
            return Err(MeridianError::invalid_transition(
                self.status(id)?.to_string(),
                RecommendationStatus::RolledBack.to_string(),
            ));
        }

        let request = ActionRequest {
            command,
            resource_id: recommendation.resource_id.clone(),
            parameters: serde_json::json!({}),
        };
        self.run_with_retries(&request).await?;

        self.transition(id, RecommendationStatus::RolledBack, actor)?;
        self.apply_inventory_effect(&recommendation.resource_id, command);
        Ok(RecommendationStatus::RolledBack)
    }

    /// Resolve recommendations stranded in Executing by a crash.
    ///
    /// Each is settled from actual provider state: confirmed-applied
    /// becomes Completed, everything else becomes Failed for manual
    /// review. Nothing is blindly re-invoked.
    pub async fn reconcile_on_restart(&self) -> Result<Vec<Uuid>> {
        let stranded = self.in_status(RecommendationStatus::Executing);
        let mut reconciled = Vec::with_capacity(stranded.len());

        for recommendation in stranded {
            let id = recommendation.id;
            let terminal_logged = self
                .ledger
                .last_for_entity(PARTITION, &id.to_string())
                .map(|entry| entry.to_state != RecommendationStatus::Executing.to_string())
                .unwrap_or(false);
            if terminal_logged {
                continue;
            }

            let command = ActionCommand::Apply(recommendation.action_type);
            let applied = match self.provider.query_state(&recommendation.resource_id).await {
                Ok(state) => state.confirms(command) == Some(true),
                Err(error) => {
                    warn!(recommendation_id = %id, %error, "reconciliation query failed");
                    false
                }
            };

            if applied {
                self.transition(id, RecommendationStatus::Completed, ACTOR_RECONCILER)?;
                self.apply_inventory_effect(&recommendation.resource_id, command);
            } else {
                self.transition(id, RecommendationStatus::Failed, ACTOR_RECONCILER)?;
            }
            reconciled.push(id);
        }
        Ok(reconciled)
    }

    /// Mirror a completed command into the resource inventory
    fn apply_inventory_effect(&self, resource_id: &str, command: ActionCommand) {
        use recommendation_engine::ActionType;

        let target = match command {
            ActionCommand::Apply(ActionType::Stop) => Some(ResourceState::Stopped),
            ActionCommand::Apply(ActionType::Delete) => Some(ResourceState::Stopped),
            ActionCommand::Revert(ActionType::Stop) => Some(ResourceState::Active),
            _ => None,
        };
        let Some(target) = target else { return };

        let current = self.inventory.get(resource_id).map(|e| e.state);
        if current == Some(target) {
            return;
        }
        if let Err(error) = self.inventory.transition_state(resource_id, target) {
            warn!(resource_id, %error, "inventory update after action failed");
        }
    }
}
