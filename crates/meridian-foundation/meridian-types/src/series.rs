use crate::period::Period;
use chrono::{DateTime, Duration, Utc};
use meridian_error::MeridianError;
use serde::{Deserialize, Serialize};

/// Represents a time range for querying time-series data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start time (inclusive)
    pub start: DateTime<Utc>,
    /// End time (exclusive)
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Create a new time range
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> crate::Result<Self> {
        if start >= end {
            return Err(MeridianError::invalid_input(
                "time_range",
                format!("start ({}) must be before end ({})", start, end),
            ));
        }
        Ok(Self { start, end })
    }

    /// Create a time range for the last N hours
    pub fn last_hours(hours: i64) -> Self {
        let end = Utc::now();
        let start = end - Duration::hours(hours);
        Self { start, end }
    }

    /// Create a time range for the last N days
    pub fn last_days(days: i64) -> Self {
        let end = Utc::now();
        let start = end - Duration::days(days);
        Self { start, end }
    }

    /// Whether a timestamp falls inside this range
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts < self.end
    }
}

/// A single data point in a time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Period this observation belongs to
    pub period: Period,
    /// Observed value
    pub value: f64,
}

impl DataPoint {
    /// Create a new data point
    pub fn new(period: Period, value: f64) -> Self {
        Self { period, value }
    }
}

/// A time series of per-period observations for one dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Name/identifier of the time series
    pub name: String,
    /// Data points in chronological order
    pub points: Vec<DataPoint>,
}

impl TimeSeries {
    /// Create a new empty time series
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            points: Vec::new(),
        }
    }

    /// Add a data point
    pub fn add_point(&mut self, point: DataPoint) {
        self.points.push(point);
    }

    /// Get the values as a vector (for baselining and forecasting)
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Number of data points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the time series is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Sort points by period (ascending)
    pub fn sort(&mut self) {
        self.points.sort_by_key(|p| p.period);
    }

    /// Add `value` into the point for `period`, creating it if absent.
    ///
    /// Ingestion aggregates many records into one per-period observation;
    /// records for an already-seen period fold into the existing point.
    pub fn accumulate(&mut self, period: Period, value: f64) {
        // Records usually arrive in period order; search from the back
        if let Some(point) = self.points.iter_mut().rev().find(|p| p.period == period) {
            point.value += value;
            return;
        }
        self.points.push(DataPoint::new(period, value));
    }

    /// Fill gaps between consecutive points with zero-valued periods.
    ///
    /// A missing period means zero usage, not absent data; baselining and
    /// scoring must see those zeros. Points must be sorted first.
    pub fn fill_gaps(&mut self) {
        if self.points.len() < 2 {
            return;
        }
        let mut filled = Vec::with_capacity(self.points.len());
        for i in 0..self.points.len() {
            if i > 0 {
                let mut cursor = self.points[i - 1].period.next();
                while cursor < self.points[i].period {
                    filled.push(DataPoint::new(cursor, 0.0));
                    cursor = cursor.next();
                }
            }
            filled.push(self.points[i].clone());
        }
        self.points = filled;
    }
}
