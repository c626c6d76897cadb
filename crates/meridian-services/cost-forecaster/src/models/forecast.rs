use chrono::{DateTime, Utc};
use meridian_types::Dimension;
use serde::{Deserialize, Serialize};

/// Forecast accuracy metrics from a holdout backtest
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracyMetrics {
    pub mae: f64,
    pub rmse: f64,
    /// Decimal fraction, 0.15 = 15%
    pub mape: f64,
}

/// One projection run for one dimension.
///
/// A new run replaces the prior series wholesale; superseded series stay
/// queryable for audit and backtesting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    pub dimension: Dimension,
    pub horizon: usize,
    pub point_estimates: Vec<f64>,
    pub lower_bound: Vec<f64>,
    pub upper_bound: Vec<f64>,
    pub generated_at: DateTime<Utc>,
    pub model_version: String,
    pub accuracy: Option<AccuracyMetrics>,
}

impl ForecastSeries {
    /// Upper bound summed over the whole horizon, the engine's
    /// worst-case spend figure for budget-risk checks
    pub fn upper_bound_total(&self) -> f64 {
        self.upper_bound.iter().sum()
    }

    /// Point estimate summed over the whole horizon
    pub fn point_total(&self) -> f64 {
        self.point_estimates.iter().sum()
    }

    /// Interval width at a zero-based horizon step
    pub fn width_at(&self, step: usize) -> Option<f64> {
        match (self.upper_bound.get(step), self.lower_bound.get(step)) {
            (Some(u), Some(l)) => Some(u - l),
            _ => None,
        }
    }
}
