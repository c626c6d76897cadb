use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use async_trait::async_trait;
use decision_workflow::{
    ActionRequest, CloudAutomation, ProviderReceipt, ProviderResourceState,
};
use meridian_engine::{AnalyticsWorker, EngineConfig, ForecastWorker, Pipeline, TracingAlertSink};
use record_normalizer::CurrencyTable;

/// Placeholder automation client used until a real provider connector is
/// attached; it acknowledges nothing and reports resources untouched.
struct DryRunAutomation;

#[async_trait]
impl CloudAutomation for DryRunAutomation {
    async fn execute(
        &self,
        request: &ActionRequest,
    ) -> meridian_error::Result<ProviderReceipt> {
        tracing::info!(command = %request.command, resource_id = %request.resource_id, "dry-run action");
        Ok(ProviderReceipt {
            provider_ref: format!("dry-run:{}", request.resource_id),
        })
    }

    async fn query_state(
        &self,
        _resource_id: &str,
    ) -> meridian_error::Result<ProviderResourceState> {
        Ok(ProviderResourceState {
            exists: true,
            running: true,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meridian_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = EngineConfig::default();
    tracing::info!(
        analytics_interval_secs = config.analytics_interval_secs,
        forecast_interval_secs = config.forecast_interval_secs,
        reporting_currency = %config.reporting_currency,
        "starting meridian decision engine"
    );

    let pipeline = Arc::new(Pipeline::new(
        &config,
        CurrencyTable::new(config.reporting_currency.clone()),
        Arc::new(DryRunAutomation),
        Arc::new(TracingAlertSink),
    ));

    // Settle anything a previous run left mid-execution before new work
    let reconciled = pipeline.reconcile_on_startup().await?;
    if !reconciled.is_empty() {
        tracing::info!(count = reconciled.len(), "reconciled stranded executions");
    }

    let analytics = AnalyticsWorker::new(
        Arc::clone(&pipeline),
        Duration::from_secs(config.analytics_interval_secs),
    );
    let forecasts = ForecastWorker::new(
        Arc::clone(&pipeline),
        Duration::from_secs(config.forecast_interval_secs),
    );
    let analytics_handle = analytics.start().await;
    let forecast_handle = forecasts.start().await;

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");

    analytics_handle.stop().await;
    forecast_handle.stop().await;
    // Refuse any further transitions once workers are down
    pipeline.ledger().seal();

    Ok(())
}
