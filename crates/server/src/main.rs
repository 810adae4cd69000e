//! Wellness inference server
//!
//! Loads the trained artifact bundle once, then serves predictions,
//! health probes and Prometheus metrics over HTTP. A bundle that fails to
//! load stops the process before the listener is bound.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use wellness_core::{
    observability::{ServingMetrics, StructuredLogger},
    ArtifactBundle, ArtifactSlot, ServingOrchestrator,
};
use wellness_server::{api, config::ServerConfig};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let config = ServerConfig::load()?;
    info!(instance = %config.instance_name, addr = %config.bind_addr(), "Server configured");

    let logger = StructuredLogger::new(&config.instance_name);
    logger.log_startup(SERVICE_VERSION, &config.artifact_dir.display().to_string());

    let metrics = ServingMetrics::new();
    metrics.set_artifacts_loaded(false);

    let slot = Arc::new(ArtifactSlot::new());
    let bundle = match slot.initialize(ArtifactBundle::load(&config.artifact_dir)) {
        Ok(bundle) => bundle,
        Err(err) => {
            logger.log_artifact_load_failed(&err.to_string());
            return Err(err).with_context(|| {
                format!(
                    "Failed to load artifacts from {}",
                    config.artifact_dir.display()
                )
            });
        }
    };

    metrics.set_artifacts_loaded(true);
    metrics.set_artifact_version(bundle.version(), bundle.classifier_kind());
    logger.log_artifacts_loaded(
        bundle.version(),
        bundle.classifier_kind(),
        bundle.labels().len(),
        bundle.departments().len(),
    );

    // Readiness follows the slot, which is loaded from here on
    let orchestrator = ServingOrchestrator::new(slot, metrics, logger.clone());
    let app_state = Arc::new(api::AppState::new(orchestrator));

    api::serve(&config.bind_addr(), app_state, shutdown_signal(logger)).await
}

async fn shutdown_signal(logger: StructuredLogger) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    logger.log_shutdown("SIGINT received");
}
