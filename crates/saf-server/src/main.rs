//! SAF Miles Predictor - HTTP scoring service
//!
//! Loads the purchase classifier once at startup and serves per-offer
//! SAF miles, CO2 and pricing predictions.

use anyhow::{Context, Result};
use saf_engine::{
    decision_log, load_classifier,
    observability::{EngineMetrics, StructuredLogger},
    pricing::SafMilesParams,
    DecisionLog, PricingEngine,
};
use saf_server::{api, config::ServerConfig};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting saf-server");

    let config = ServerConfig::load()?;
    info!(model_path = %config.model_path.display(), "Server configured");

    let metrics = EngineMetrics::new();
    let logger = StructuredLogger::new("saf-server");

    // No fallback model: a missing or corrupt artifact aborts startup
    let loaded = load_classifier(&config.model_path, config.model_sha256())
        .context("Failed to load classifier")?;
    metrics.set_model_info(loaded.info.format.as_str(), &loaded.info.sha256);
    logger.log_model_loaded(&loaded.info);
    logger.log_feature_drift(
        SafMilesParams::SERVING.scarcity_rate,
        SafMilesParams::TRAINING.scarcity_rate,
    );

    let mut engine = PricingEngine::new(loaded.classifier)
        .context("Failed to build pricing engine")?
        .with_logger(logger.clone());

    let log_writer = match config.decision_log_path() {
        Some(path) => {
            info!(path = %path.display(), "Decision log enabled");
            let (log, handle) = DecisionLog::spawn(path, config.decision_log_capacity, metrics.clone());
            engine = engine.with_decision_log(log);
            Some(handle)
        }
        None => None,
    };

    let state = Arc::new(api::AppState::new(Arc::new(engine), config.in_band_errors));
    let router = api::create_router(state, &config.cors_origins());

    let addr = config.bind_addr();
    logger.log_startup(SERVICE_VERSION, &addr);

    let shutdown_logger = logger.clone();
    api::serve(&addr, router, async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => shutdown_logger.log_shutdown("SIGINT received"),
            Err(e) => {
                warn!(error = %e, "Cannot listen for shutdown signal");
                std::future::pending::<()>().await
            }
        }
    })
    .await?;

    // Router (and with it the engine's log sender) is gone; let the writer drain
    if let Some(handle) = log_writer {
        decision_log::join_writer(handle).await;
    }

    info!("Shutting down");
    Ok(())
}
