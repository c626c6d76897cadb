use dashmap::DashMap;
use meridian_types::Dimension;

use crate::models::ForecastSeries;

/// Per-dimension forecast history.
///
/// A run's series replaces the latest for its dimension; superseded runs
/// are retained (never mutated) for audit and backtesting.
#[derive(Debug, Default)]
pub struct ForecastStore {
    series: DashMap<Dimension, Vec<ForecastSeries>>,
}

impl ForecastStore {
    pub fn new() -> Self {
        Self {
            series: DashMap::new(),
        }
    }

    /// Record a completed run, superseding the previous series
    pub fn put(&self, series: ForecastSeries) {
        self.series
            .entry(series.dimension.clone())
            .or_default()
            .push(series);
    }

    /// The current (most recent) series for a dimension
    pub fn latest(&self, dimension: &Dimension) -> Option<ForecastSeries> {
        self.series
            .get(dimension)
            .and_then(|runs| runs.last().cloned())
    }

    /// All runs ever recorded for a dimension, oldest first
    pub fn history(&self, dimension: &Dimension) -> Vec<ForecastSeries> {
        self.series
            .get(dimension)
            .map(|runs| runs.clone())
            .unwrap_or_default()
    }

    /// Number of dimensions with at least one run
    pub fn dimension_count(&self) -> usize {
        self.series.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn series(dim: &Dimension, version: &str) -> ForecastSeries {
        ForecastSeries {
            dimension: dim.clone(),
            horizon: 1,
            point_estimates: vec![1.0],
            lower_bound: vec![0.5],
            upper_bound: vec![1.5],
            generated_at: Utc::now(),
            model_version: version.to_string(),
            accuracy: None,
        }
    }

    #[test]
    fn test_put_replaces_latest_but_retains_history() {
        let store = ForecastStore::new();
        let dim = Dimension::account("123");

        store.put(series(&dim, "run-1"));
        store.put(series(&dim, "run-2"));

        assert_eq!(store.latest(&dim).unwrap().model_version, "run-2");
        let history = store.history(&dim);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].model_version, "run-1");
    }

    #[test]
    fn test_unknown_dimension() {
        let store = ForecastStore::new();
        let dim = Dimension::account("123");
        assert!(store.latest(&dim).is_none());
        assert!(store.history(&dim).is_empty());
    }
}
