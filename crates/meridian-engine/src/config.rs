use anomaly_detector::DetectorConfig;
use cost_forecaster::ForecasterConfig;
use decision_workflow::WorkflowConfig;
use recommendation_engine::RulesConfig;
use serde::{Deserialize, Serialize};

fn env_parse<T: std::str::FromStr>(name: &str, fallback: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Cadence of the ingestion/anomaly/recommendation cycle, in seconds
    pub analytics_interval_secs: u64,
    /// Cadence of the forecast cycle, in seconds
    pub forecast_interval_secs: u64,
    /// Currency every record is converted into
    pub reporting_currency: String,
    /// Bound on retained utilization samples per resource
    pub max_utilization_samples: usize,
    pub detector: DetectorConfig,
    pub forecaster: ForecasterConfig,
    pub rules: RulesConfig,
    pub workflow: WorkflowConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            analytics_interval_secs: env_parse("ENGINE_ANALYTICS_INTERVAL_SECS", 900),
            forecast_interval_secs: env_parse("ENGINE_FORECAST_INTERVAL_SECS", 86_400),
            reporting_currency: std::env::var("ENGINE_REPORTING_CURRENCY")
                .unwrap_or_else(|_| "USD".to_string()),
            max_utilization_samples: env_parse("ENGINE_MAX_UTILIZATION_SAMPLES", 672),
            detector: DetectorConfig::default(),
            forecaster: ForecasterConfig::default(),
            rules: RulesConfig::default(),
            workflow: WorkflowConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.analytics_interval_secs, 900);
        assert_eq!(config.forecast_interval_secs, 86_400);
        assert_eq!(config.reporting_currency, "USD");
        assert!(config.max_utilization_samples > 0);
    }
}
