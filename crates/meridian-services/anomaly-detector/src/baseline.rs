use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Rolling window of recent observations with incrementally maintained
/// mean and standard deviation.
///
/// Pushing beyond capacity evicts the oldest observation; sum and
/// sum-of-squares are updated in O(1) per push.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollingBaseline {
    capacity: usize,
    window: VecDeque<f64>,
    sum: f64,
    sum_sq: f64,
}

impl RollingBaseline {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            window: VecDeque::with_capacity(capacity.max(1)),
            sum: 0.0,
            sum_sq: 0.0,
        }
    }

    /// Add an observation, evicting the oldest when at capacity
    pub fn push(&mut self, value: f64) {
        if self.window.len() == self.capacity {
            if let Some(old) = self.window.pop_front() {
                self.sum -= old;
                self.sum_sq -= old * old;
            }
        }
        self.window.push_back(value);
        self.sum += value;
        self.sum_sq += value * value;
    }

    /// Number of observations currently in the window
    pub fn count(&self) -> usize {
        self.window.len()
    }

    /// Mean of the windowed observations
    pub fn mean(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        self.sum / self.window.len() as f64
    }

    /// Population standard deviation of the windowed observations.
    ///
    /// The variance is clamped at zero: the incremental sums can drift a
    /// hair negative on constant series.
    pub fn stddev(&self) -> f64 {
        let n = self.window.len() as f64;
        if n == 0.0 {
            return 0.0;
        }
        let mean = self.sum / n;
        let variance = (self.sum_sq / n - mean * mean).max(0.0);
        variance.sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_baseline() {
        let baseline = RollingBaseline::new(5);
        assert_eq!(baseline.count(), 0);
        assert_eq!(baseline.mean(), 0.0);
        assert_eq!(baseline.stddev(), 0.0);
    }

    #[test]
    fn test_mean_and_stddev() {
        let mut baseline = RollingBaseline::new(10);
        for v in [10.0, 20.0, 10.0, 20.0] {
            baseline.push(v);
        }
        assert_eq!(baseline.mean(), 15.0);
        assert!((baseline.stddev() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_constant_series_zero_stddev() {
        let mut baseline = RollingBaseline::new(10);
        for _ in 0..10 {
            baseline.push(42.0);
        }
        assert_eq!(baseline.mean(), 42.0);
        assert_eq!(baseline.stddev(), 0.0);
    }

    #[test]
    fn test_window_eviction() {
        let mut baseline = RollingBaseline::new(3);
        for v in [100.0, 1.0, 2.0, 3.0] {
            baseline.push(v);
        }
        // 100.0 evicted
        assert_eq!(baseline.count(), 3);
        assert_eq!(baseline.mean(), 2.0);
    }

    #[test]
    fn test_eviction_keeps_sums_consistent() {
        let mut baseline = RollingBaseline::new(4);
        for i in 0..100 {
            baseline.push((i % 7) as f64);
        }
        // Recompute from scratch and compare
        let values: Vec<f64> = (96..100).map(|i| (i % 7) as f64).collect();
        let mean: f64 = values.iter().sum::<f64>() / values.len() as f64;
        let var: f64 =
            values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / values.len() as f64;
        assert!((baseline.mean() - mean).abs() < 1e-9);
        assert!((baseline.stddev() - var.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut baseline = RollingBaseline::new(0);
        baseline.push(1.0);
        assert_eq!(baseline.count(), 1);
    }
}
