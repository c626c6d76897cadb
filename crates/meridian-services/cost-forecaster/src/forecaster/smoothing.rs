use meridian_error::{MeridianError, Result};

/// Additive Holt-Winters exponential smoothing.
///
/// Level + trend components, plus an additive seasonal component when a
/// cycle length is supplied. Fitting and prediction are closed-form over
/// the input: no randomness, so identical history and configuration give
/// identical forecasts.
pub struct HoltWintersForecaster {
    alpha: f64,
    beta: f64,
    gamma: f64,
    seasonal_period: Option<usize>,
    state: Option<FittedState>,
}

#[derive(Debug, Clone)]
struct FittedState {
    level: f64,
    trend: f64,
    /// Additive seasonal indices; empty when non-seasonal
    seasonals: Vec<f64>,
    /// Standard deviation of one-step-ahead fit residuals
    sigma: f64,
    /// Observations consumed, for seasonal phase continuation
    n_obs: usize,
}

/// Forecast result with confidence intervals
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastWithIntervals {
    pub point_forecast: Vec<f64>,
    pub lower_bound: Vec<f64>,
    pub upper_bound: Vec<f64>,
}

impl HoltWintersForecaster {
    /// Create an untrained forecaster with the given smoothing factors
    pub fn new(alpha: f64, beta: f64, gamma: f64, seasonal_period: Option<usize>) -> Self {
        Self {
            alpha,
            beta,
            gamma,
            seasonal_period: seasonal_period.filter(|&m| m >= 2),
            state: None,
        }
    }

    /// Check if the model has been trained
    pub fn is_trained(&self) -> bool {
        self.state.is_some()
    }

    /// Residual standard deviation of the fitted model
    pub fn sigma(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.sigma)
    }

    /// Fit the model on historical data.
    ///
    /// Requires at least 4 points, or two full cycles in seasonal mode.
    pub fn train(&mut self, data: &[f64]) -> Result<()> {
        let required = match self.seasonal_period {
            Some(m) => (2 * m).max(4),
            None => 4,
        };
        if data.len() < required {
            return Err(MeridianError::invalid_input(
                "history",
                format!("need at least {} points, got {}", required, data.len()),
            ));
        }

        let state = match self.seasonal_period {
            Some(m) => self.fit_seasonal(data, m),
            None => self.fit_trend_only(data),
        };
        self.state = Some(state);
        Ok(())
    }

    fn fit_trend_only(&self, data: &[f64]) -> FittedState {
        let mut level = data[0];
        let mut trend = data[1] - data[0];
        let mut sq_err = 0.0;
        let mut residuals = 0usize;

        for &observed in &data[1..] {
            let predicted = level + trend;
            let error = observed - predicted;
            sq_err += error * error;
            residuals += 1;

            let next_level = self.alpha * observed + (1.0 - self.alpha) * (level + trend);
            trend = self.beta * (next_level - level) + (1.0 - self.beta) * trend;
            level = next_level;
        }

        FittedState {
            level,
            trend,
            seasonals: Vec::new(),
            sigma: (sq_err / residuals as f64).sqrt(),
            n_obs: data.len(),
        }
    }

    fn fit_seasonal(&self, data: &[f64], m: usize) -> FittedState {
        let first_cycle_mean: f64 = data[..m].iter().sum::<f64>() / m as f64;
        let second_cycle_mean: f64 = data[m..2 * m].iter().sum::<f64>() / m as f64;

        let mut level = first_cycle_mean;
        let mut trend = (second_cycle_mean - first_cycle_mean) / m as f64;
        let mut seasonals: Vec<f64> = data[..m].iter().map(|v| v - first_cycle_mean).collect();

        let mut sq_err = 0.0;
        let mut residuals = 0usize;

        for (t, &observed) in data.iter().enumerate().skip(m) {
            let phase = t % m;
            let predicted = level + trend + seasonals[phase];
            let error = observed - predicted;
            sq_err += error * error;
            residuals += 1;

            let next_level =
                self.alpha * (observed - seasonals[phase]) + (1.0 - self.alpha) * (level + trend);
            trend = self.beta * (next_level - level) + (1.0 - self.beta) * trend;
            seasonals[phase] =
                self.gamma * (observed - next_level) + (1.0 - self.gamma) * seasonals[phase];
            level = next_level;
        }

        FittedState {
            level,
            trend,
            seasonals,
            sigma: (sq_err / residuals as f64).sqrt(),
            n_obs: data.len(),
        }
    }

    /// Generate point forecasts for the specified horizon
    pub fn forecast(&self, horizon: usize) -> Result<Vec<f64>> {
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| MeridianError::internal("forecast requested before training"))?;

        let points = (1..=horizon)
            .map(|k| {
                let mut value = state.level + k as f64 * state.trend;
                if !state.seasonals.is_empty() {
                    let phase = (state.n_obs + k - 1) % state.seasonals.len();
                    value += state.seasonals[phase];
                }
                value
            })
            .collect();
        Ok(points)
    }

    /// Generate forecasts with symmetric prediction intervals.
    ///
    /// The half-width at step k is `z * sigma * sqrt(k)`: uncertainty
    /// compounds with horizon, so the band widens strictly monotonically
    /// whenever the fit left any residual variance.
    pub fn forecast_with_intervals(
        &self,
        horizon: usize,
        z: f64,
    ) -> Result<ForecastWithIntervals> {
        let point_forecast = self.forecast(horizon)?;
        let sigma = self
            .sigma()
            .ok_or_else(|| MeridianError::internal("forecast requested before training"))?;

        let mut lower_bound = Vec::with_capacity(horizon);
        let mut upper_bound = Vec::with_capacity(horizon);
        for (k, &point) in point_forecast.iter().enumerate() {
            let half_width = z * sigma * ((k + 1) as f64).sqrt();
            lower_bound.push(point - half_width);
            upper_bound.push(point + half_width);
        }

        Ok(ForecastWithIntervals {
            point_forecast,
            lower_bound,
            upper_bound,
        })
    }
}

impl Default for HoltWintersForecaster {
    fn default() -> Self {
        Self::new(0.3, 0.1, 0.1, None)
    }
}
