//! Shared time-series and aggregation types for the Meridian cost engine.
//!
//! This crate provides the dimension and period primitives used by the
//! anomaly detector, forecaster, and recommendation engine to key and
//! exchange cost observations.

pub mod dimension;
pub mod period;
pub mod series;

// Re-exports
pub use dimension::Dimension;
pub use period::Period;
pub use series::{DataPoint, TimeRange, TimeSeries};

/// Result type re-exported for convenience
pub type Result<T> = meridian_error::Result<T>;
