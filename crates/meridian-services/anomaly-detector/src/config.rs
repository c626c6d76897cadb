use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Observation periods kept in each rolling baseline
    pub window_len: usize,
    /// |deviation score| at which a warning-severity event fires
    pub warning_threshold: f64,
    /// |deviation score| at which the event is critical instead
    pub critical_threshold: f64,
    /// Periods after an anomaly clears during which a re-onset is suppressed
    pub cooldown_periods: usize,
    /// Seasonal cycle length in periods; baselines then compare against
    /// the same phase in prior cycles instead of a flat window
    pub seasonal_period: Option<usize>,
    /// Floor applied to the baseline stddev to avoid dividing by zero on
    /// near-constant series
    pub stddev_floor: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            window_len: std::env::var("ANOMALY_WINDOW_LEN")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            warning_threshold: std::env::var("ANOMALY_WARNING_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2.0),
            critical_threshold: std::env::var("ANOMALY_CRITICAL_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3.5),
            cooldown_periods: std::env::var("ANOMALY_COOLDOWN_PERIODS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
            seasonal_period: std::env::var("ANOMALY_SEASONAL_PERIOD")
                .ok()
                .and_then(|v| v.parse().ok()),
            stddev_floor: 1e-6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DetectorConfig::default();
        assert_eq!(config.window_len, 30);
        assert_eq!(config.warning_threshold, 2.0);
        assert_eq!(config.critical_threshold, 3.5);
        assert_eq!(config.cooldown_periods, 1);
        assert!(config.stddev_floor > 0.0);
    }
}
