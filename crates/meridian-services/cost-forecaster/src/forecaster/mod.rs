pub mod metrics;
pub mod smoothing;
pub mod validation;

pub use metrics::{mean_absolute_error, mean_absolute_percentage_error, root_mean_squared_error};
pub use smoothing::{ForecastWithIntervals, HoltWintersForecaster};
pub use validation::{backtest_forecast, split_train_test, BacktestResult};
