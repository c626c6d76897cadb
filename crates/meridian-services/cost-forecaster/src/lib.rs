//! Cost forecasting service.
//!
//! Fits an additive exponential-smoothing model (level + trend, plus a
//! seasonal component where a periodicity is configured) over the
//! trailing history of each cost dimension and projects point estimates
//! with symmetric confidence bounds that widen with horizon. The model
//! is fully deterministic: identical history and configuration always
//! produce an identical series, which is what makes backtests and
//! reproducible tests possible.

pub mod config;
pub mod forecaster;
pub mod models;
pub mod service;

pub use config::ForecasterConfig;
pub use forecaster::{
    mean_absolute_error, mean_absolute_percentage_error, root_mean_squared_error,
    HoltWintersForecaster,
};
pub use models::{AccuracyMetrics, ForecastSeries};
pub use service::{ForecastService, ForecastStore};

pub use meridian_error::{MeridianError, Result};
