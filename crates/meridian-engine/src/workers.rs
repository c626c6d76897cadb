//! Periodic pipeline workers.
//!
//! Each worker owns one cadence from the concurrency model: the
//! analytics worker runs the ingest-side cycles (anomaly scoring,
//! recommendation evaluation, execution) every few minutes, and the
//! forecast worker refreshes projections daily. Both expose a stop
//! handle for graceful shutdown.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::pipeline::{CycleStats, Pipeline};

/// Handle for controlling a running worker
pub struct WorkerHandle {
    running: Arc<RwLock<bool>>,
    task: tokio::task::JoinHandle<()>,
}

impl WorkerHandle {
    /// Stop the worker gracefully
    pub async fn stop(self) {
        {
            let mut running = self.running.write().await;
            *running = false;
        }
        if let Err(e) = self.task.await {
            error!("error waiting for worker to stop: {}", e);
        }
    }

    /// Check if the worker is still running
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }
}

/// Runs anomaly scoring, recommendation evaluation, and execution on the
/// ingestion cadence.
pub struct AnalyticsWorker {
    pipeline: Arc<Pipeline>,
    interval: Duration,
    last_stats: Arc<RwLock<Option<CycleStats>>>,
}

impl AnalyticsWorker {
    pub fn new(pipeline: Arc<Pipeline>, interval: Duration) -> Self {
        Self {
            pipeline,
            interval,
            last_stats: Arc::new(RwLock::new(None)),
        }
    }

    /// Statistics from the most recent cycle
    pub async fn last_stats(&self) -> Option<CycleStats> {
        self.last_stats.read().await.clone()
    }

    pub async fn start(&self) -> WorkerHandle {
        let running = Arc::new(RwLock::new(true));
        let running_clone = Arc::clone(&running);
        let pipeline = Arc::clone(&self.pipeline);
        let last_stats = Arc::clone(&self.last_stats);
        let interval = self.interval;

        let task = tokio::spawn(async move {
            info!(?interval, "analytics worker started");
            loop {
                {
                    let is_running = running_clone.read().await;
                    if !*is_running {
                        info!("analytics worker stopping");
                        break;
                    }
                }

                let mut stats = CycleStats::default();
                pipeline.run_anomaly_cycle(&mut stats);
                let summary = pipeline.run_recommendation_cycle(&mut stats);
                let execution = pipeline.run_execution_cycle(&mut stats).await;

                match (summary, execution) {
                    (Ok(summary), Ok(())) => {
                        info!(
                            anomalies = stats.anomalies_emitted,
                            recommendations = stats.recommendations_created,
                            completed = stats.executions_completed,
                            failed = stats.executions_failed,
                            potential_savings = %summary.total_potential_savings,
                            "analytics cycle complete"
                        );
                    }
                    (summary, execution) => {
                        // A fatal error here means the audit invariant is
                        // at risk; stop the worker rather than continue
                        for error in [summary.err(), execution.err()].into_iter().flatten() {
                            error!(%error, "analytics cycle aborted");
                        }
                        let mut is_running = running_clone.write().await;
                        *is_running = false;
                    }
                }
                if !stats.errors.is_empty() {
                    warn!(errors = stats.errors.len(), "cycle completed with local errors");
                }
                {
                    let mut last = last_stats.write().await;
                    *last = Some(stats);
                }

                tokio::time::sleep(interval).await;
            }
        });

        WorkerHandle { running, task }
    }
}

/// Refreshes per-dimension forecasts on the daily cadence.
pub struct ForecastWorker {
    pipeline: Arc<Pipeline>,
    interval: Duration,
}

impl ForecastWorker {
    pub fn new(pipeline: Arc<Pipeline>, interval: Duration) -> Self {
        Self { pipeline, interval }
    }

    pub async fn start(&self) -> WorkerHandle {
        let running = Arc::new(RwLock::new(true));
        let running_clone = Arc::clone(&running);
        let pipeline = Arc::clone(&self.pipeline);
        let interval = self.interval;

        let task = tokio::spawn(async move {
            info!(?interval, "forecast worker started");
            loop {
                {
                    let is_running = running_clone.read().await;
                    if !*is_running {
                        info!("forecast worker stopping");
                        break;
                    }
                }

                let mut stats = CycleStats::default();
                pipeline.run_forecast_cycle(&mut stats);
                info!(
                    forecast = stats.dimensions_forecast,
                    skipped = stats.dimensions_skipped,
                    "forecast cycle complete"
                );

                tokio::time::sleep(interval).await;
            }
        });

        WorkerHandle { running, task }
    }
}
