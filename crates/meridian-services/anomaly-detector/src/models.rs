use chrono::{DateTime, Utc};
use meridian_types::{Dimension, Period};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Severity of a detected anomaly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// A detected deviation from a dimension's rolling baseline.
///
/// Immutable and terminal once emitted; downstream consumers reference it
/// by id as recommendation evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyEvent {
    pub id: Uuid,
    pub dimension: Dimension,
    pub baseline_mean: f64,
    pub baseline_stddev: f64,
    pub observed_value: f64,
    pub deviation_score: f64,
    pub severity: Severity,
    pub detected_at: DateTime<Utc>,
    /// Aggregation period the observation belongs to
    pub period: Period,
}
