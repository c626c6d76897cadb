//! Anomaly detection service.
//!
//! Maintains a rolling statistical baseline per cost dimension and scores
//! each new aggregation period against it. Only the onset of an anomaly
//! emits an [`AnomalyEvent`]; sustained deviations and re-onsets inside
//! the cooldown are suppressed. Baseline state is owned by the detector
//! instance and injected, never ambient, so parallel test instances are
//! cheap.

pub mod baseline;
pub mod config;
pub mod detector;
pub mod models;

pub use baseline::RollingBaseline;
pub use config::DetectorConfig;
pub use detector::AnomalyDetector;
pub use models::{AnomalyEvent, Severity};

pub use meridian_error::{MeridianError, Result};
