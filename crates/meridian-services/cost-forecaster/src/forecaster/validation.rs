use meridian_error::{MeridianError, Result};

use crate::forecaster::metrics::{
    mean_absolute_error, mean_absolute_percentage_error, root_mean_squared_error,
};
use crate::forecaster::smoothing::HoltWintersForecaster;
use crate::models::AccuracyMetrics;

/// Holdout backtest over one series
#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub train_size: usize,
    pub test_size: usize,
    pub predictions: Vec<f64>,
    pub actuals: Vec<f64>,
    pub metrics: AccuracyMetrics,
}

/// Split a series into train and test slices
pub fn split_train_test(data: &[f64], train_size: usize) -> Result<(&[f64], &[f64])> {
    if train_size == 0 || train_size >= data.len() {
        return Err(MeridianError::invalid_input(
            "train_size",
            format!("must be in 1..{} for {} points", data.len(), data.len()),
        ));
    }
    Ok(data.split_at(train_size))
}

/// Fit on the first `train_size` points and score the forecast against
/// the next `test_size` held-out actuals.
pub fn backtest_forecast(
    data: &[f64],
    train_size: usize,
    test_size: usize,
    seasonal_period: Option<usize>,
) -> Result<BacktestResult> {
    if data.len() < train_size + test_size {
        return Err(MeridianError::invalid_input(
            "history",
            format!(
                "need {} points for backtest, have {}",
                train_size + test_size,
                data.len()
            ),
        ));
    }

    let (train, rest) = split_train_test(data, train_size)?;
    let actuals: Vec<f64> = rest[..test_size].to_vec();

    let mut forecaster = HoltWintersForecaster::new(0.3, 0.1, 0.1, seasonal_period);
    forecaster.train(train)?;
    let predictions = forecaster.forecast(test_size)?;

    let metrics = AccuracyMetrics {
        mae: mean_absolute_error(&predictions, &actuals),
        rmse: root_mean_squared_error(&predictions, &actuals),
        mape: mean_absolute_percentage_error(&predictions, &actuals),
    };

    Ok(BacktestResult {
        train_size,
        test_size,
        predictions,
        actuals,
        metrics,
    })
}
