// =============================================================================
// ORB Engine — Main Entry Point
// =============================================================================
//
// Loads configuration, wires the Yahoo Finance candle source into the engine
// and serves the REST API until Ctrl+C.
// =============================================================================

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use orb_engine::api;
use orb_engine::app_state::AppState;
use orb_engine::{Engine, EngineConfig, SystemClock, YahooClient};

const DEFAULT_CONFIG_PATH: &str = "orb_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & logging ─────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("ORB Engine starting up");

    // ── 2. Configuration ─────────────────────────────────────────────────
    let config_path =
        std::env::var("ORB_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let mut config = match EngineConfig::load(&config_path) {
        Ok(cfg) => {
            info!(path = %config_path, "Loaded engine config");
            cfg
        }
        Err(e) => {
            warn!(path = %config_path, error = %e, "No usable config file, using defaults");
            let cfg = EngineConfig::default();
            if let Err(e) = cfg.save(&config_path) {
                error!(path = %config_path, error = %e, "Failed to write default config");
            }
            cfg
        }
    };
    config.apply_env_overrides();

    info!(
        symbols = config.symbols.len(),
        timezone = %config.session.timezone,
        cache_ttl_secs = config.cache_ttl_secs,
        scan_concurrency = config.scan_concurrency,
        provider = %config.provider.base_url,
        "Effective configuration"
    );

    // ── 3. Engine ────────────────────────────────────────────────────────
    let clock = Arc::new(SystemClock);
    let source = Arc::new(
        YahooClient::new(&config.provider, clock.clone()).context("building market data client")?,
    );
    let engine = Engine::new(&config, source, clock).context("building ORB engine")?;
    let state = Arc::new(AppState::new(Arc::new(engine)));

    // ── 4. API server ────────────────────────────────────────────────────
    let app = api::router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding API server to {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server failed")?;

    info!("ORB Engine shut down complete.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C, serving until killed");
        std::future::pending::<()>().await;
    }
    warn!("Shutdown signal received, stopping gracefully");
}
