//! Meridian decision engine pipeline.
//!
//! Wires the pipeline stages together: record normalization feeds the
//! anomaly detector and forecaster, their signals feed the
//! recommendation engine, and its output drives the approval workflow,
//! the action executor, and the audit ledger. Batch cycles run as
//! periodic background workers; independent accounts and dimensions
//! share no mutable state beyond the append-only stores.

pub mod alerts;
pub mod config;
pub mod pipeline;
pub mod workers;

pub use alerts::{AlertSink, TracingAlertSink};
pub use config::EngineConfig;
pub use pipeline::{CycleStats, IngestStats, Pipeline};
pub use workers::{AnalyticsWorker, ForecastWorker, WorkerHandle};

pub use meridian_error::{MeridianError, Result};
