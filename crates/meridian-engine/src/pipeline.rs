use std::sync::Arc;

use anomaly_detector::{AnomalyDetector, AnomalyEvent};
use audit_ledger::AuditLedger;
use cost_forecaster::{ForecastSeries, ForecastService};
use dashmap::DashMap;
use decision_workflow::{CloudAutomation, Decision, WorkflowService};
use meridian_types::{Dimension, Period, TimeSeries};
use record_normalizer::{CostRecord, CurrencyTable, Normalizer, RawRecordBatch};
use recommendation_engine::{
    ActionType, OptimizationSummary, Recommendation, RecommendationEngine, RecommendationStatus,
    RuleContext,
};
use resource_inventory::{InventoryStore, ResourceEntity, UtilizationSample};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::alerts::AlertSink;
use crate::config::EngineConfig;
use crate::{MeridianError, Result};

/// Retained anomaly events per aggregation key
const RECENT_ANOMALY_CAP: usize = 64;

/// Outcome of one ingestion call
#[derive(Debug, Default, Clone, Copy)]
pub struct IngestStats {
    pub records: usize,
    pub rejects: usize,
}

/// Outcome of one analytics cycle
#[derive(Debug, Default, Clone)]
pub struct CycleStats {
    pub anomalies_emitted: usize,
    pub dimensions_forecast: usize,
    pub dimensions_skipped: usize,
    pub recommendations_created: usize,
    pub executions_completed: usize,
    pub executions_failed: usize,
    pub errors: Vec<String>,
}

/// The assembled decision engine.
///
/// Ingestion, anomaly detection, and forecasting are periodic batch
/// stages over append-only history; the workflow stage owns the only
/// mutual exclusion (per-resource execution locks).
pub struct Pipeline {
    normalizer: Normalizer,
    inventory: Arc<InventoryStore>,
    detector: AnomalyDetector,
    forecaster: ForecastService,
    engine: RecommendationEngine,
    workflow: Arc<WorkflowService>,
    ledger: Arc<AuditLedger>,
    alerts: Arc<dyn AlertSink>,
    /// Per-dimension cost history, aggregated per period at ingest
    history: DashMap<Dimension, TimeSeries>,
    /// Last period already scored by the anomaly detector, per dimension
    scored_watermark: DashMap<Dimension, Period>,
    /// Recent anomaly events keyed by account id and resource id
    recent_anomalies: DashMap<String, Vec<AnomalyEvent>>,
}

impl Pipeline {
    pub fn new(
        config: &EngineConfig,
        currency_table: CurrencyTable,
        provider: Arc<dyn CloudAutomation>,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        let ledger = Arc::new(AuditLedger::new());
        let inventory = Arc::new(InventoryStore::new(config.max_utilization_samples));
        let workflow = Arc::new(WorkflowService::new(
            config.workflow.clone(),
            Arc::clone(&ledger),
            provider,
            Arc::clone(&inventory),
        ));

        Self {
            normalizer: Normalizer::new(currency_table),
            inventory,
            detector: AnomalyDetector::new(config.detector.clone()),
            forecaster: ForecastService::new(config.forecaster.clone()),
            engine: RecommendationEngine::new(config.rules.clone()),
            workflow,
            ledger,
            alerts,
            history: DashMap::new(),
            scored_watermark: DashMap::new(),
            recent_anomalies: DashMap::new(),
        }
    }

    pub fn ledger(&self) -> &Arc<AuditLedger> {
        &self.ledger
    }

    pub fn inventory(&self) -> &Arc<InventoryStore> {
        &self.inventory
    }

    pub fn workflow(&self) -> &Arc<WorkflowService> {
        &self.workflow
    }

    /// Inbound boundary: one raw batch from a provider connector.
    ///
    /// Normalizes, registers resources, and folds amounts into the
    /// per-dimension history. Per-record failures are already contained
    /// by the normalizer; they surface here only as reject counts.
    pub fn ingest_batch(&self, batch: &RawRecordBatch) -> Result<IngestStats> {
        let normalized = self.normalizer.normalize_batch(batch)?;
        for record in &normalized.records {
            self.inventory.upsert_from_record(record, "cloud-resource");
            self.fold_into_history(record);
        }
        let stats = IngestStats {
            records: normalized.records.len(),
            rejects: normalized.rejects.len(),
        };
        info!(
            provider = %batch.provider,
            records = stats.records,
            rejects = stats.rejects,
            "batch ingested"
        );
        Ok(stats)
    }

    /// Inbound boundary: a utilization sample from the monitoring
    /// collaborator.
    pub fn ingest_utilization(
        &self,
        resource_id: &str,
        sample: UtilizationSample,
        provisioned_capacity: Option<f64>,
    ) -> Result<()> {
        self.inventory.record_utilization(resource_id, sample)?;
        if let Some(capacity) = provisioned_capacity {
            self.inventory.set_capacity(resource_id, capacity)?;
        }
        Ok(())
    }

    /// Inbound boundary: an approval decision from the dashboard
    /// collaborator.
    pub fn apply_decision(
        &self,
        recommendation_id: Uuid,
        decision: Decision,
        actor: &str,
        rationale: Option<String>,
    ) -> Result<RecommendationStatus> {
        self.workflow
            .decide(recommendation_id, decision, actor, rationale)
    }

    fn fold_into_history(&self, record: &CostRecord) {
        use rust_decimal::prelude::ToPrimitive;
        let amount = record.amount.to_f64().unwrap_or(0.0);

        for dimension in [
            Dimension::account(&record.account_id),
            Dimension::service(&record.account_id, &record.service),
            Dimension::resource(&record.resource_id),
        ] {
            let mut series = self
                .history
                .entry(dimension.clone())
                .or_insert_with(|| TimeSeries::new(dimension.to_string()));
            series.accumulate(record.period, amount);
        }
    }

    /// Score every dimension's unscored periods against its baseline.
    ///
    /// Dimensions are independent; a failure in one is recorded and the
    /// rest of the cycle proceeds.
    pub fn run_anomaly_cycle(&self, stats: &mut CycleStats) {
        for entry in self.history.iter() {
            let dimension = entry.key().clone();
            let mut series = entry.value().clone();
            drop(entry);

            series.sort();
            series.fill_gaps();
            let watermark = self.scored_watermark.get(&dimension).map(|p| *p);

            for point in &series.points {
                if watermark.is_some_and(|w| point.period <= w) {
                    continue;
                }
                match self.detector.observe(&dimension, point.period, point.value) {
                    Ok(Some(event)) => {
                        self.alerts.anomaly(&event);
                        self.remember_anomaly(&event);
                        stats.anomalies_emitted += 1;
                    }
                    Ok(None) => {}
                    Err(error) => {
                        stats.errors.push(format!("{}: {}", dimension, error));
                        break;
                    }
                }
            }
            if let Some(last) = series.points.last() {
                self.scored_watermark.insert(dimension, last.period);
            }
        }
    }

    fn remember_anomaly(&self, event: &AnomalyEvent) {
        let keys = match &event.dimension {
            Dimension::Account { account_id } => vec![account_id.clone()],
            Dimension::Service { account_id, .. } => vec![account_id.clone()],
            Dimension::Resource { resource_id } => vec![resource_id.clone()],
        };
        for key in keys {
            let mut bucket = self.recent_anomalies.entry(key).or_default();
            bucket.push(event.clone());
            let overflow = bucket.len().saturating_sub(RECENT_ANOMALY_CAP);
            if overflow > 0 {
                bucket.drain(..overflow);
            }
        }
    }

    /// Refresh forecasts for every account dimension with enough history.
    ///
    /// `InsufficientHistory` skips the dimension for this run; anything
    /// else is recorded and the cycle continues.
    pub fn run_forecast_cycle(&self, stats: &mut CycleStats) {
        for entry in self.history.iter() {
            let dimension = entry.key().clone();
            if !matches!(dimension, Dimension::Account { .. }) {
                continue;
            }
            let series = entry.value().clone();
            drop(entry);

            match self.forecaster.run(&dimension, &series) {
                Ok(_) => stats.dimensions_forecast += 1,
                Err(MeridianError::InsufficientHistory { .. }) => {
                    debug!(%dimension, "insufficient history, dimension skipped this run");
                    stats.dimensions_skipped += 1;
                }
                Err(error) => {
                    warn!(%dimension, %error, "forecast failed");
                    stats.errors.push(format!("{}: {}", dimension, error));
                }
            }
        }
    }

    /// Evaluate the rule set over the current inventory and hand new
    /// recommendations to the workflow.
    pub fn run_recommendation_cycle(&self, stats: &mut CycleStats) -> Result<OptimizationSummary> {
        let entities = self.inventory.list();

        let prepared: Vec<(ResourceEntity, Decimal, Vec<AnomalyEvent>, Option<ForecastSeries>)> =
            entities
                .into_iter()
                .map(|entity| {
                    let recent_cost = self.recent_cost_of(&entity.resource_id);
                    let mut anomalies = self.anomalies_for(&entity.account_id);
                    anomalies.extend(self.anomalies_for(&entity.resource_id));
                    let forecast = self
                        .forecaster
                        .store()
                        .latest(&Dimension::account(&entity.account_id));
                    (entity, recent_cost, anomalies, forecast)
                })
                .collect();

        let contexts: Vec<RuleContext<'_>> = prepared
            .iter()
            .map(|(entity, recent_cost, anomalies, forecast)| RuleContext {
                entity,
                recent_cost: *recent_cost,
                anomalies,
                forecast: forecast.as_ref(),
            })
            .collect();

        let recommendations = self.engine.evaluate(&contexts)?;
        let total_cost: Decimal = prepared.iter().map(|(e, ..)| e.monthly_cost).sum();
        let summary = RecommendationEngine::summarize(&recommendations, total_cost);

        for recommendation in recommendations {
            if recommendation.action_type == ActionType::Schedule {
                self.alerts.budget_risk(&recommendation);
            }
            if self.workflow.has_active_for_resource(&recommendation.resource_id) {
                debug!(
                    resource_id = %recommendation.resource_id,
                    "resource already has an in-flight recommendation, skipping"
                );
                continue;
            }
            self.dispatch_recommendation(recommendation, stats)?;
        }
        Ok(summary)
    }

    /// Admit one recommendation and drive it to the approval stage.
    ///
    /// Stale evidence leaves it Proposed for the next cycle; ledger
    /// failures abort the run.
    fn dispatch_recommendation(
        &self,
        recommendation: Recommendation,
        stats: &mut CycleStats,
    ) -> Result<()> {
        let id = self.workflow.admit(recommendation)?;
        match self.workflow.submit(id) {
            Ok(status) => {
                stats.recommendations_created += 1;
                debug!(recommendation_id = %id, %status, "recommendation submitted");
            }
            Err(MeridianError::EvidenceStale { .. }) => {
                debug!(recommendation_id = %id, "evidence stale, left Proposed for re-evaluation");
            }
            Err(error) if error.is_fatal_to_run() => return Err(error),
            Err(error) => {
                warn!(recommendation_id = %id, %error, "submission failed");
                stats.errors.push(error.to_string());
            }
        }
        Ok(())
    }

    /// Execute everything currently Approved.
    ///
    /// Lock timeouts leave the recommendation Approved for the next
    /// cycle; only ledger failures abort.
    pub async fn run_execution_cycle(&self, stats: &mut CycleStats) -> Result<()> {
        for recommendation in self.workflow.in_status(RecommendationStatus::Approved) {
            match self.workflow.execute(recommendation.id).await {
                Ok(RecommendationStatus::Completed) => stats.executions_completed += 1,
                Ok(RecommendationStatus::Failed) => stats.executions_failed += 1,
                Ok(_) => {}
                Err(MeridianError::LockTimeout { .. }) => {
                    debug!(
                        recommendation_id = %recommendation.id,
                        "execution lock busy, retrying next cycle"
                    );
                }
                Err(error) if error.is_fatal_to_run() => return Err(error),
                Err(error) => {
                    warn!(recommendation_id = %recommendation.id, %error, "execution error");
                    stats.errors.push(error.to_string());
                }
            }
        }
        Ok(())
    }

    /// Settle any work stranded in Executing by a crash before workers
    /// start.
    pub async fn reconcile_on_startup(&self) -> Result<Vec<Uuid>> {
        self.workflow.reconcile_on_restart().await
    }

    fn recent_cost_of(&self, resource_id: &str) -> Decimal {
        self.history
            .get(&Dimension::resource(resource_id))
            .and_then(|series| series.points.last().map(|p| p.value))
            .and_then(Decimal::from_f64)
            .unwrap_or(Decimal::ZERO)
    }

    fn anomalies_for(&self, key: &str) -> Vec<AnomalyEvent> {
        self.recent_anomalies
            .get(key)
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}
