use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use audit_ledger::AuditLedger;
use chrono::Utc;
use decision_workflow::{
    ActionCommand, ActionRequest, CloudAutomation, Decision, MeridianError, ProviderReceipt,
    ProviderResourceState, RecommendationStatus, WorkflowConfig, WorkflowService,
};
use meridian_types::Period;
use record_normalizer::{CostRecord, Provider};
use recommendation_engine::{ActionType, EvidenceRef, Recommendation};
use resource_inventory::{InventoryStore, ResourceState};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

/// Scriptable provider double: fails the first `fail_times` executes,
/// then succeeds and mirrors the command into its reported state.
struct MockProvider {
    fail_times: AtomicU32,
    execute_calls: AtomicU32,
    delay: Option<Duration>,
    state: Mutex<ProviderResourceState>,
}

impl MockProvider {
    fn new() -> Self {
        Self {
            fail_times: AtomicU32::new(0),
            execute_calls: AtomicU32::new(0),
            delay: None,
            state: Mutex::new(ProviderResourceState {
                exists: true,
                running: true,
            }),
        }
    }

    fn failing(times: u32) -> Self {
        let provider = Self::new();
        provider.fail_times.store(times, Ordering::SeqCst);
        provider
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn set_state(&self, exists: bool, running: bool) {
        *self.state.lock().unwrap() = ProviderResourceState { exists, running };
    }
}

#[async_trait]
impl CloudAutomation for MockProvider {
    async fn execute(
        &self,
        request: &ActionRequest,
    ) -> Result<ProviderReceipt, MeridianError> {
        self.execute_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_times.load(Ordering::SeqCst) > 0 {
            self.fail_times.fetch_sub(1, Ordering::SeqCst);
            return Err(MeridianError::provider_call_failed(
                request.command.to_string(),
                "simulated provider outage",
            ));
        }
        let mut state = self.state.lock().unwrap();
        match request.command {
            ActionCommand::Apply(ActionType::Stop) => state.running = false,
            ActionCommand::Apply(ActionType::Delete) => state.exists = false,
            ActionCommand::Revert(ActionType::Stop) => state.running = true,
            _ => {}
        }
        Ok(ProviderReceipt {
            provider_ref: format!("op-{}", self.execute_calls.load(Ordering::SeqCst)),
        })
    }

    async fn query_state(
        &self,
        _resource_id: &str,
    ) -> Result<ProviderResourceState, MeridianError> {
        Ok(*self.state.lock().unwrap())
    }
}

fn fast_config() -> WorkflowConfig {
    WorkflowConfig {
        evidence_max_age_secs: 3600,
        auto_approve_cap: dec!(50),
        max_attempts: 3,
        backoff_base_ms: 1,
        lock_timeout_ms: 2_000,
        provider_call_timeout_ms: 2_000,
    }
}

fn inventory_with(resource_id: &str) -> Arc<InventoryStore> {
    let store = Arc::new(InventoryStore::new(32));
    let record = CostRecord {
        provider: Provider::Aws,
        account_id: "123".to_string(),
        resource_id: resource_id.to_string(),
        service: "EC2".to_string(),
        region: "us-east-1".to_string(),
        period: Period::from_timestamp(Utc::now()),
        amount: dec!(0.10),
        currency: "USD".to_string(),
        usage_quantity: 1.0,
        tags: HashMap::new(),
    };
    store.upsert_from_record(&record, "vm");
    store
}

fn recommendation(resource_id: &str, action: ActionType, savings: Decimal) -> Recommendation {
    Recommendation {
        id: Uuid::new_v4(),
        resource_id: resource_id.to_string(),
        action_type: action,
        estimated_monthly_savings: savings,
        confidence: 0.9,
        evidence: vec![EvidenceRef::Utilization {
            resource_id: resource_id.to_string(),
            observed_at: Utc::now(),
        }],
        status: RecommendationStatus::Proposed,
        description: "test".to_string(),
        created_at: Utc::now(),
    }
}

fn service_with(provider: Arc<MockProvider>, config: WorkflowConfig) -> WorkflowService {
    WorkflowService::new(
        config,
        Arc::new(AuditLedger::new()),
        provider,
        inventory_with("i-1"),
    )
}

#[tokio::test]
async fn test_auto_approve_under_cap_passes_through_approved() {
    let service = service_with(Arc::new(MockProvider::new()), fast_config());
    let id = service
        .admit(recommendation("i-1", ActionType::Stop, dec!(30)))
        .unwrap();

    let status = service.submit(id).unwrap();
    assert_eq!(status, RecommendationStatus::Approved);

    // Approved was a logged state, not a skip
    let decision = service.decision(id).unwrap();
    assert_eq!(decision.actor, "auto-approve-policy");
    assert_eq!(decision.decision, Decision::Approve);
}

#[tokio::test]
async fn test_large_savings_wait_for_human_approval() {
    let service = service_with(Arc::new(MockProvider::new()), fast_config());
    let id = service
        .admit(recommendation("i-1", ActionType::Stop, dec!(500)))
        .unwrap();

    let status = service.submit(id).unwrap();
    assert_eq!(status, RecommendationStatus::PendingApproval);
    assert!(service.decision(id).is_none());
}

#[tokio::test]
async fn test_stale_evidence_keeps_recommendation_proposed() {
    let service = service_with(Arc::new(MockProvider::new()), fast_config());
    let mut rec = recommendation("i-1", ActionType::Stop, dec!(30));
    rec.evidence = vec![EvidenceRef::Utilization {
        resource_id: "i-1".to_string(),
        observed_at: Utc::now() - chrono::Duration::days(7),
    }];
    let id = service.admit(rec).unwrap();

    let err = service.submit(id).unwrap_err();
    assert!(matches!(err, MeridianError::EvidenceStale { .. }));
    assert_eq!(service.status(id).unwrap(), RecommendationStatus::Proposed);
}

#[tokio::test]
async fn test_empty_evidence_is_rejected_as_stale() {
    let service = service_with(Arc::new(MockProvider::new()), fast_config());
    let mut rec = recommendation("i-1", ActionType::Stop, dec!(30));
    rec.evidence.clear();
    let id = service.admit(rec).unwrap();

    assert!(service.submit(id).is_err());
    assert_eq!(service.status(id).unwrap(), RecommendationStatus::Proposed);
}

#[tokio::test]
async fn test_reject_is_terminal() {
    let service = service_with(Arc::new(MockProvider::new()), fast_config());
    let id = service
        .admit(recommendation("i-1", ActionType::Stop, dec!(500)))
        .unwrap();
    service.submit(id).unwrap();

    service
        .decide(id, Decision::Reject, "alice", Some("not worth it".to_string()))
        .unwrap();
    assert_eq!(service.status(id).unwrap(), RecommendationStatus::Rejected);

    // No further driving possible
    assert!(service.execute(id).await.is_err());
    assert!(service
        .decide(id, Decision::Approve, "bob", None)
        .is_err());
}

#[tokio::test]
async fn test_withdraw_before_execution() {
    let service = service_with(Arc::new(MockProvider::new()), fast_config());
    let id = service
        .admit(recommendation("i-1", ActionType::Stop, dec!(500)))
        .unwrap();
    service.submit(id).unwrap();

    service.withdraw(id, "alice").unwrap();
    assert_eq!(service.status(id).unwrap(), RecommendationStatus::Rejected);
}

#[tokio::test]
async fn test_execute_happy_path_with_write_ahead_audit() {
    let provider = Arc::new(MockProvider::new());
    let ledger = Arc::new(AuditLedger::new());
    let inventory = inventory_with("i-1");
    let service = WorkflowService::new(
        fast_config(),
        Arc::clone(&ledger),
        Arc::clone(&provider) as Arc<dyn CloudAutomation>,
        Arc::clone(&inventory),
    );

    let id = service
        .admit(recommendation("i-1", ActionType::Stop, dec!(30)))
        .unwrap();
    service.submit(id).unwrap();

    let status = service.execute(id).await.unwrap();
    assert_eq!(status, RecommendationStatus::Completed);

    // Full audited path, in order
    let states: Vec<String> = ledger
        .entries_for_entity("workflow", &id.to_string())
        .iter()
        .map(|e| e.to_state.clone())
        .collect();
    assert_eq!(
        states,
        vec!["PendingApproval", "Approved", "Executing", "Completed"]
    );
    assert!(ledger.verify_chain("workflow"));

    // Side effects landed
    assert_eq!(
        inventory.get("i-1").unwrap().state,
        ResourceState::Stopped
    );
    assert!(!provider.state.lock().unwrap().running);
}

#[tokio::test]
async fn test_execute_requires_approval_first() {
    let service = service_with(Arc::new(MockProvider::new()), fast_config());
    let id = service
        .admit(recommendation("i-1", ActionType::Stop, dec!(500)))
        .unwrap();

    // Proposed: not executable
    assert!(service.execute(id).await.is_err());
    service.submit(id).unwrap();
    // PendingApproval: still not executable
    let err = service.execute(id).await.unwrap_err();
    assert!(matches!(err, MeridianError::InvalidTransition { .. }));
}

#[tokio::test]
async fn test_transient_failures_retry_then_complete() {
    let provider = Arc::new(MockProvider::failing(2));
    let service = service_with(Arc::clone(&provider), fast_config());
    let id = service
        .admit(recommendation("i-1", ActionType::Stop, dec!(30)))
        .unwrap();
    service.submit(id).unwrap();

    let status = service.execute(id).await.unwrap();
    assert_eq!(status, RecommendationStatus::Completed);
    assert_eq!(provider.execute_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_exhausted_retries_leave_failed_for_review() {
    let provider = Arc::new(MockProvider::failing(10));
    let ledger = Arc::new(AuditLedger::new());
    let service = WorkflowService::new(
        fast_config(),
        Arc::clone(&ledger),
        Arc::clone(&provider) as Arc<dyn CloudAutomation>,
        inventory_with("i-1"),
    );
    let id = service
        .admit(recommendation("i-1", ActionType::Stop, dec!(30)))
        .unwrap();
    service.submit(id).unwrap();

    let status = service.execute(id).await.unwrap();
    assert_eq!(status, RecommendationStatus::Failed);
    assert_eq!(provider.execute_calls.load(Ordering::SeqCst), 3);

    // The audit trail explains the last successful step
    let last = ledger.last_for_entity("workflow", &id.to_string()).unwrap();
    assert_eq!(last.from_state, "Executing");
    assert_eq!(last.to_state, "Failed");
}

#[tokio::test]
async fn test_failed_call_that_actually_applied_is_not_reinvoked() {
    // The call errors but the stop did land; the state query must catch
    // it and no second invocation may happen
    let provider = Arc::new(MockProvider::failing(10));
    provider.set_state(true, false);
    let service = service_with(Arc::clone(&provider), fast_config());
    let id = service
        .admit(recommendation("i-1", ActionType::Stop, dec!(30)))
        .unwrap();
    service.submit(id).unwrap();

    let status = service.execute(id).await.unwrap();
    assert_eq!(status, RecommendationStatus::Completed);
    assert_eq!(provider.execute_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_indeterminate_outcome_is_never_blindly_retried() {
    let provider = Arc::new(MockProvider::failing(10));
    let service = service_with(Arc::clone(&provider), fast_config());
    let id = service
        .admit(recommendation("i-1", ActionType::Rightsize, dec!(30)))
        .unwrap();
    service.submit(id).unwrap();

    let status = service.execute(id).await.unwrap();
    assert_eq!(status, RecommendationStatus::Failed);
    // One attempt only: a rightsize outcome cannot be confirmed from state
    assert_eq!(provider.execute_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_concurrent_executes_one_resource_exactly_one_wins() {
    let provider = Arc::new(MockProvider::new().with_delay(Duration::from_millis(200)));
    let config = WorkflowConfig {
        lock_timeout_ms: 50,
        ..fast_config()
    };
    let service = Arc::new(service_with(Arc::clone(&provider), config));

    let first = service
        .admit(recommendation("i-1", ActionType::Stop, dec!(30)))
        .unwrap();
    let second = service
        .admit(recommendation("i-1", ActionType::Rightsize, dec!(30)))
        .unwrap();
    service.submit(first).unwrap();
    service.submit(second).unwrap();

    let racer = {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.execute(first).await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;

    let err = service.execute(second).await.unwrap_err();
    assert!(matches!(err, MeridianError::LockTimeout { .. }));
    // The loser stays Approved for a later retry, never dropped
    assert_eq!(service.status(second).unwrap(), RecommendationStatus::Approved);

    let status = racer.await.unwrap().unwrap();
    assert_eq!(status, RecommendationStatus::Completed);
}

#[tokio::test]
async fn test_rollback_runs_inverse_under_lock() {
    let provider = Arc::new(MockProvider::new());
    let inventory = inventory_with("i-1");
    let service = WorkflowService::new(
        fast_config(),
        Arc::new(AuditLedger::new()),
        Arc::clone(&provider) as Arc<dyn CloudAutomation>,
        Arc::clone(&inventory),
    );
    let id = service
        .admit(recommendation("i-1", ActionType::Stop, dec!(30)))
        .unwrap();
    service.submit(id).unwrap();
    service.execute(id).await.unwrap();
    assert_eq!(inventory.get("i-1").unwrap().state, ResourceState::Stopped);

    let status = service.rollback(id, "alice").await.unwrap();
    assert_eq!(status, RecommendationStatus::RolledBack);
    assert!(provider.state.lock().unwrap().running);
    assert_eq!(inventory.get("i-1").unwrap().state, ResourceState::Active);

    // Terminal: no second rollback
    assert!(service.rollback(id, "alice").await.is_err());
}

#[tokio::test]
async fn test_delete_rejects_rollback_as_irreversible() {
    let provider = Arc::new(MockProvider::new());
    let service = service_with(Arc::clone(&provider), fast_config());
    let id = service
        .admit(recommendation("i-1", ActionType::Delete, dec!(30)))
        .unwrap();
    service.submit(id).unwrap();
    service.execute(id).await.unwrap();

    let err = service.rollback(id, "alice").await.unwrap_err();
    assert!(matches!(err, MeridianError::IrreversibleAction { .. }));
    // Only that rollback request failed; the recommendation is untouched
    assert_eq!(service.status(id).unwrap(), RecommendationStatus::Completed);
}

#[tokio::test]
async fn test_reconciliation_completes_confirmed_work() {
    let provider = Arc::new(MockProvider::new());
    let ledger = Arc::new(AuditLedger::new());
    let inventory = inventory_with("i-1");

    // Simulate a crash window: the ledger shows Executing with no
    // terminal entry, and the provider says the stop did land
    let rec = recommendation("i-1", ActionType::Stop, dec!(30));
    let id = rec.id;
    for (from, to) in [
        ("Proposed", "PendingApproval"),
        ("PendingApproval", "Approved"),
        ("Approved", "Executing"),
    ] {
        ledger
            .append("workflow", "recommendation", &id.to_string(), from, to, "decision-engine")
            .unwrap();
    }
    provider.set_state(true, false);

    let service = WorkflowService::new(
        fast_config(),
        Arc::clone(&ledger),
        Arc::clone(&provider) as Arc<dyn CloudAutomation>,
        Arc::clone(&inventory),
    );
    service.hydrate(vec![rec]).unwrap();
    assert_eq!(service.status(id).unwrap(), RecommendationStatus::Executing);

    let reconciled = service.reconcile_on_restart().await.unwrap();
    assert_eq!(reconciled, vec![id]);
    assert_eq!(service.status(id).unwrap(), RecommendationStatus::Completed);
    assert_eq!(inventory.get("i-1").unwrap().state, ResourceState::Stopped);
    // No blind re-invocation happened
    assert_eq!(provider.execute_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_reconciliation_fails_unconfirmed_work() {
    let provider = Arc::new(MockProvider::new());
    let ledger = Arc::new(AuditLedger::new());

    let rec = recommendation("i-1", ActionType::Stop, dec!(30));
    let id = rec.id;
    for (from, to) in [
        ("Proposed", "PendingApproval"),
        ("PendingApproval", "Approved"),
        ("Approved", "Executing"),
    ] {
        ledger
            .append("workflow", "recommendation", &id.to_string(), from, to, "decision-engine")
            .unwrap();
    }
    // Provider still reports the resource running: nothing applied

    let service = WorkflowService::new(
        fast_config(),
        Arc::clone(&ledger),
        Arc::clone(&provider) as Arc<dyn CloudAutomation>,
        inventory_with("i-1"),
    );
    service.hydrate(vec![rec]).unwrap();

    service.reconcile_on_restart().await.unwrap();
    assert_eq!(service.status(id).unwrap(), RecommendationStatus::Failed);
    assert_eq!(provider.execute_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_sealed_ledger_aborts_transitions() {
    let ledger = Arc::new(AuditLedger::new());
    let service = WorkflowService::new(
        fast_config(),
        Arc::clone(&ledger),
        Arc::new(MockProvider::new()) as Arc<dyn CloudAutomation>,
        inventory_with("i-1"),
    );
    let id = service
        .admit(recommendation("i-1", ActionType::Stop, dec!(30)))
        .unwrap();

    ledger.seal();
    let err = service.submit(id).unwrap_err();
    assert!(err.is_fatal_to_run());
    // Write-ahead: no unaudited state change happened
    assert_eq!(service.status(id).unwrap(), RecommendationStatus::Proposed);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    /// Commands an external driver might throw at the workflow, legal
    /// or not, in any order
    #[derive(Debug, Clone, Copy)]
    enum Command {
        Submit,
        Approve,
        Reject,
        Withdraw,
        Execute,
        Rollback,
    }

    fn command_strategy() -> impl Strategy<Value = Command> {
        prop_oneof![
            Just(Command::Submit),
            Just(Command::Approve),
            Just(Command::Reject),
            Just(Command::Withdraw),
            Just(Command::Execute),
            Just(Command::Rollback),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// No command sequence can reach Executing without an Approved
        /// entry earlier in the same entity's audit trail, and every
        /// logged transition is one the table allows.
        #[test]
        fn test_executing_always_preceded_by_approved(
            commands in proptest::collection::vec(command_strategy(), 1..40),
            savings in 1u32..1000u32,
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .unwrap();
            runtime.block_on(async move {
                let ledger = Arc::new(AuditLedger::new());
                let service = WorkflowService::new(
                    fast_config(),
                    Arc::clone(&ledger),
                    Arc::new(MockProvider::new()) as Arc<dyn CloudAutomation>,
                    inventory_with("i-1"),
                );
                let id = service
                    .admit(recommendation("i-1", ActionType::Stop, Decimal::from(savings)))
                    .unwrap();

                for command in commands {
                    // Illegal commands must error, never corrupt state
                    let _ = match command {
                        Command::Submit => service.submit(id).map(|_| ()),
                        Command::Approve => service
                            .decide(id, Decision::Approve, "prop", None)
                            .map(|_| ()),
                        Command::Reject => service
                            .decide(id, Decision::Reject, "prop", None)
                            .map(|_| ()),
                        Command::Withdraw => service.withdraw(id, "prop"),
                        Command::Execute => service.execute(id).await.map(|_| ()),
                        Command::Rollback => service.rollback(id, "prop").await.map(|_| ()),
                    };
                }

                let trail = ledger.entries_for_entity("workflow", &id.to_string());
                let mut approved_seen = false;
                for entry in &trail {
                    let from: RecommendationStatus = entry.from_state.parse().unwrap();
                    let to: RecommendationStatus = entry.to_state.parse().unwrap();
                    prop_assert!(
                        RecommendationStatus::can_transition(from, to),
                        "illegal transition logged: {} -> {}",
                        from,
                        to
                    );
                    if to == RecommendationStatus::Executing {
                        prop_assert!(
                            approved_seen,
                            "Executing reached without a prior Approved entry"
                        );
                    }
                    if to == RecommendationStatus::Approved {
                        approved_seen = true;
                    }
                }
                prop_assert!(ledger.verify_chain("workflow"));
                Ok(())
            })?;
        }
    }
}
