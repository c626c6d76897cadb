use chrono::Utc;
use dashmap::DashMap;
use meridian_types::{Dimension, Period, TimeSeries};
use tracing::{debug, info};
use uuid::Uuid;

use crate::baseline::RollingBaseline;
use crate::config::DetectorConfig;
use crate::models::{AnomalyEvent, Severity};
use crate::Result;

/// Baseline and emission state for one dimension
#[derive(Debug)]
struct DimensionState {
    /// One baseline per seasonal phase; a single entry when no
    /// periodicity is configured
    baselines: Vec<RollingBaseline>,
    /// Inside a sustained anomaly: suppress everything but the onset
    in_anomaly: bool,
    /// Period at which the last anomaly cleared, for cooldown
    cleared_at: Option<Period>,
}

impl DimensionState {
    fn new(config: &DetectorConfig) -> Self {
        let phases = config.seasonal_period.unwrap_or(1).max(1);
        Self {
            baselines: (0..phases)
                .map(|_| RollingBaseline::new(config.window_len))
                .collect(),
            in_anomaly: false,
            cleared_at: None,
        }
    }

    /// Baseline for the phase this period falls into.
    ///
    /// The phase index is derived from hours since the epoch so it is
    /// stable across restarts and across dimensions.
    fn baseline_for(&mut self, period: &Period) -> &mut RollingBaseline {
        let phases = self.baselines.len();
        let phase = (period.start().timestamp() / 3600).rem_euclid(phases as i64) as usize;
        &mut self.baselines[phase]
    }
}

/// Scores per-period observations against rolling baselines and emits
/// anomaly events on onset transitions.
pub struct AnomalyDetector {
    config: DetectorConfig,
    states: DashMap<Dimension, DimensionState>,
}

impl AnomalyDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            states: DashMap::new(),
        }
    }

    /// Score one observation for a dimension's aggregation period.
    ///
    /// The observation is scored against the baseline as it stood before
    /// this period, then folded into it. Returns an event only for an
    /// anomaly onset outside the cooldown window.
    pub fn observe(
        &self,
        dimension: &Dimension,
        period: Period,
        observed: f64,
    ) -> Result<Option<AnomalyEvent>> {
        let mut state = self
            .states
            .entry(dimension.clone())
            .or_insert_with(|| DimensionState::new(&self.config));

        let cooldown = self.config.cooldown_periods;
        let warning = self.config.warning_threshold;
        let critical = self.config.critical_threshold;
        let floor = self.config.stddev_floor;

        let was_in_anomaly = state.in_anomaly;
        let cleared_at = state.cleared_at;
        let baseline = state.baseline_for(&period);

        // A single observation has no spread to score against
        let scored = if baseline.count() >= 2 {
            let mean = baseline.mean();
            let stddev = baseline.stddev().max(floor);
            let score = (observed - mean) / stddev;
            Some((mean, baseline.stddev(), score))
        } else {
            None
        };
        baseline.push(observed);

        let Some((mean, stddev, score)) = scored else {
            return Ok(None);
        };

        let anomalous = score.abs() >= warning;
        let mut event = None;

        if anomalous {
            let in_cooldown = cleared_at
                .map(|p| p.distance_to(&period) <= cooldown)
                .unwrap_or(false);
            if !was_in_anomaly && !in_cooldown {
                let severity = if score.abs() >= critical {
                    Severity::Critical
                } else {
                    Severity::Warning
                };
                info!(
                    %dimension,
                    %period,
                    score,
                    %severity,
                    "anomaly onset"
                );
                event = Some(AnomalyEvent {
                    id: Uuid::new_v4(),
                    dimension: dimension.clone(),
                    baseline_mean: mean,
                    baseline_stddev: stddev,
                    observed_value: observed,
                    deviation_score: score,
                    severity,
                    detected_at: Utc::now(),
                    period,
                });
            } else {
                debug!(%dimension, %period, score, "sustained anomaly, suppressed");
            }
            state.in_anomaly = true;
        } else if was_in_anomaly {
            debug!(%dimension, %period, score, "anomaly cleared");
            state.in_anomaly = false;
            state.cleared_at = Some(period);
        }

        Ok(event)
    }

    /// Score a whole series for one dimension.
    ///
    /// Points are sorted and gaps are filled with zero-usage periods
    /// before scoring; missing data is zero usage, not absent data.
    pub fn observe_series(
        &self,
        dimension: &Dimension,
        series: &TimeSeries,
    ) -> Result<Vec<AnomalyEvent>> {
        let mut series = series.clone();
        series.sort();
        series.fill_gaps();

        let mut events = Vec::new();
        for point in &series.points {
            if let Some(event) = self.observe(dimension, point.period, point.value)? {
                events.push(event);
            }
        }
        Ok(events)
    }

    /// Number of dimensions with baseline state
    pub fn tracked_dimensions(&self) -> usize {
        self.states.len()
    }
}
