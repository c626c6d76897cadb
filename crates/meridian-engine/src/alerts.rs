use anomaly_detector::AnomalyEvent;
use recommendation_engine::Recommendation;
use tracing::warn;

/// Outbound boundary to the alerting/notification collaborator.
///
/// Receives anomaly events and budget-risk recommendations as they are
/// produced; delivery is the collaborator's concern.
pub trait AlertSink: Send + Sync {
    fn anomaly(&self, event: &AnomalyEvent);
    fn budget_risk(&self, recommendation: &Recommendation);
}

/// Default sink: surfaces alerts as structured log events
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn anomaly(&self, event: &AnomalyEvent) {
        warn!(
            dimension = %event.dimension,
            severity = %event.severity,
            score = event.deviation_score,
            observed = event.observed_value,
            baseline_mean = event.baseline_mean,
            "cost anomaly"
        );
    }

    fn budget_risk(&self, recommendation: &Recommendation) {
        warn!(
            resource_id = %recommendation.resource_id,
            savings = %recommendation.estimated_monthly_savings,
            description = %recommendation.description,
            "budget risk"
        );
    }
}
