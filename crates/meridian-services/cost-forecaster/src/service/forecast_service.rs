use chrono::Utc;
use meridian_error::MeridianError;
use meridian_types::{Dimension, TimeSeries};
use tracing::{debug, info};

use crate::config::ForecasterConfig;
use crate::forecaster::{backtest_forecast, HoltWintersForecaster};
use crate::models::ForecastSeries;
use crate::service::store::ForecastStore;
use crate::Result;

/// Holdout length used for the accuracy backtest when history allows
const BACKTEST_HOLDOUT: usize = 7;

/// Runs per-dimension forecasts and records them in the store.
pub struct ForecastService {
    config: ForecasterConfig,
    store: ForecastStore,
}

impl ForecastService {
    pub fn new(config: ForecasterConfig) -> Self {
        Self {
            config,
            store: ForecastStore::new(),
        }
    }

    pub fn store(&self) -> &ForecastStore {
        &self.store
    }

    /// Preprocess historical data: clamp IQR outliers to the median so a
    /// single billing spike does not bend the trend component.
    fn preprocess_data(&self, data: &[f64]) -> Vec<f64> {
        if data.len() < 4 {
            return data.to_vec();
        }
        let mut sorted = data.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let q1 = sorted[sorted.len() / 4];
        let q3 = sorted[3 * sorted.len() / 4];
        let iqr = q3 - q1;
        let lower_bound = q1 - 1.5 * iqr;
        let upper_bound = q3 + 1.5 * iqr;
        let median = sorted[sorted.len() / 2];

        data.iter()
            .map(|&x| {
                if x < lower_bound || x > upper_bound {
                    median
                } else {
                    x
                }
            })
            .collect()
    }

    /// Produce a new forecast series for one dimension, replacing the
    /// prior series in the store.
    ///
    /// Fails with `InsufficientHistory` when the dimension's trailing
    /// history is shorter than the configured minimum; the caller skips
    /// the dimension for this run.
    pub fn run(&self, dimension: &Dimension, history: &TimeSeries) -> Result<ForecastSeries> {
        let mut history = history.clone();
        history.sort();
        history.fill_gaps();
        let values = history.values();

        if values.len() < self.config.min_history {
            return Err(MeridianError::insufficient_history(
                dimension.to_string(),
                self.config.min_history,
                values.len(),
            ));
        }

        let processed = self.preprocess_data(&values);

        let mut forecaster = HoltWintersForecaster::new(
            self.config.alpha,
            self.config.beta,
            self.config.gamma,
            self.config.seasonal_period,
        );
        forecaster.train(&processed)?;
        let forecast = forecaster.forecast_with_intervals(self.config.horizon, self.config.confidence_z)?;

        let accuracy = if processed.len() >= self.config.min_history + BACKTEST_HOLDOUT {
            let train_size = processed.len() - BACKTEST_HOLDOUT;
            match backtest_forecast(
                &processed,
                train_size,
                BACKTEST_HOLDOUT,
                self.config.seasonal_period,
            ) {
                Ok(backtest) => Some(backtest.metrics),
                Err(error) => {
                    debug!(%dimension, %error, "backtest skipped");
                    None
                }
            }
        } else {
            None
        };

        let series = ForecastSeries {
            dimension: dimension.clone(),
            horizon: self.config.horizon,
            point_estimates: forecast.point_forecast,
            lower_bound: forecast.lower_bound,
            upper_bound: forecast.upper_bound,
            generated_at: Utc::now(),
            model_version: self.config.model_version.clone(),
            accuracy,
        };

        info!(
            %dimension,
            horizon = series.horizon,
            model = %series.model_version,
            "forecast series generated"
        );
        self.store.put(series.clone());
        Ok(series)
    }
}
