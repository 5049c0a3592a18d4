//! # lotgate-api: Binary Entry Point
//!
//! Loads the plant configuration named by `LOTGATE_CONFIG` and serves the
//! lifecycle API on `PORT` (default 8080). Set `LOTGATE_LOG_FORMAT=json`
//! for JSON log lines.

use std::sync::Arc;

use anyhow::Context;

use lotgate_api::AppState;
use lotgate_engine::{PlantConfig, SystemClock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config_path =
        std::env::var("LOTGATE_CONFIG").context("LOTGATE_CONFIG must name a plant configuration")?;
    let config = PlantConfig::load(&config_path)
        .with_context(|| format!("loading plant configuration {config_path}"))?;

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let engine = config
        .build_engine(Arc::new(SystemClock))
        .context("building lifecycle engine")?;
    tracing::info!(
        supervisor = %config.supervisor,
        operators = config.operator_tiers.len(),
        vessels = config.vessel_requirements.len(),
        audit_events = engine.audit().len(),
        "plant loaded"
    );

    let app = lotgate_api::app(AppState::new(engine));

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("lotgate API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json = std::env::var("LOTGATE_LOG_FORMAT").is_ok_and(|v| v == "json");
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
