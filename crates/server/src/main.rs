//! Energy predictor server
//!
//! Serves either the environmental impact predictor or the substation
//! efficiency predictor over HTTP, depending on configuration. Every model is
//! loaded before the listener opens.

use anyhow::{Context, Result};
use serving_lib::{api, startup, HealthRegistry, ServingMetrics, StructuredLogger};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let config = config::ServerConfig::load()?;

    let logger = StructuredLogger::new(&config.instance_name);
    logger.log_startup(SERVER_VERSION, &config.service.to_string());
    info!(
        service = %config.service,
        model_dir = %config.model_dir.display(),
        "Server configured"
    );

    let state = startup::start(
        config.service,
        &config.model_sources(),
        HealthRegistry::new(),
        ServingMetrics::new(),
        logger.clone(),
    )
    .await
    .context("startup aborted")?;

    let shutdown_logger = logger.clone();
    let shutdown = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
        shutdown_logger.log_shutdown("SIGINT received");
    };

    api::serve(&config.bind_addr(), state, shutdown).await?;
    info!("Server stopped");

    Ok(())
}
