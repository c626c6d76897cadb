/// Calculate Mean Absolute Percentage Error (MAPE)
///
/// MAPE = mean(|actual - forecast| / |actual|)
///
/// Returned as a decimal (0.15 = 15%). Zero actuals contribute zero
/// rather than dividing by zero.
pub fn mean_absolute_percentage_error(forecast: &[f64], actual: &[f64]) -> f64 {
    let n = forecast.len().min(actual.len());
    if n == 0 {
        return 0.0;
    }

    let sum: f64 = forecast
        .iter()
        .zip(actual.iter())
        .take(n)
        .map(|(f, a)| {
            if a.abs() < f64::EPSILON {
                0.0
            } else {
                (a - f).abs() / a.abs()
            }
        })
        .sum();

    sum / n as f64
}

/// Calculate Root Mean Squared Error (RMSE)
///
/// RMSE = sqrt(mean((actual - forecast)^2))
pub fn root_mean_squared_error(forecast: &[f64], actual: &[f64]) -> f64 {
    let n = forecast.len().min(actual.len());
    if n == 0 {
        return 0.0;
    }

    let sum_squared_errors: f64 = forecast
        .iter()
        .zip(actual.iter())
        .take(n)
        .map(|(f, a)| (a - f).powi(2))
        .sum();

    (sum_squared_errors / n as f64).sqrt()
}

/// Calculate Mean Absolute Error (MAE)
///
/// MAE = mean(|actual - forecast|)
pub fn mean_absolute_error(forecast: &[f64], actual: &[f64]) -> f64 {
    let n = forecast.len().min(actual.len());
    if n == 0 {
        return 0.0;
    }

    let sum_absolute_errors: f64 = forecast
        .iter()
        .zip(actual.iter())
        .take(n)
        .map(|(f, a)| (a - f).abs())
        .sum();

    sum_absolute_errors / n as f64
}
