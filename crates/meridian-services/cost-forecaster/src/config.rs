use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecasterConfig {
    /// Minimum trailing periods a dimension needs before it is forecast
    pub min_history: usize,
    /// Default projection horizon in periods
    pub horizon: usize,
    /// Seasonal cycle length in periods, when the dimension has one
    pub seasonal_period: Option<usize>,
    /// Level smoothing factor
    pub alpha: f64,
    /// Trend smoothing factor
    pub beta: f64,
    /// Seasonal smoothing factor
    pub gamma: f64,
    /// z-score for the confidence bounds (1.96 for a 95% interval)
    pub confidence_z: f64,
    /// Stamped on every produced series
    pub model_version: String,
}

impl Default for ForecasterConfig {
    fn default() -> Self {
        Self {
            min_history: std::env::var("FORECAST_MIN_HISTORY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(14),
            horizon: std::env::var("FORECAST_HORIZON")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            seasonal_period: std::env::var("FORECAST_SEASONAL_PERIOD")
                .ok()
                .and_then(|v| v.parse().ok()),
            alpha: 0.3,
            beta: 0.1,
            gamma: 0.1,
            confidence_z: 1.96,
            model_version: "holt-winters-additive-1".to_string(),
        }
    }
}
