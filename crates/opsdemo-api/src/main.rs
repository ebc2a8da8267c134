//! opsdemo server binary.
//!
//! - Config from `$OPSDEMO_CONFIG` (default `opsdemo.yaml`, optional)
//! - Diagnostics via tracing on stderr, access log on stdout
//! - Graceful shutdown on Ctrl-C

use opsdemo_core::error::{OpsError, Result};

use opsdemo_api::{app_state, config, obs, router};

const DEFAULT_CONFIG_PATH: &str = "opsdemo.yaml";

#[tokio::main]
async fn main() -> Result<()> {
    let path = std::env::var("OPSDEMO_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let cfg = config::load_or_default(&path)?;
    obs::init_tracing(&cfg.logging);

    let listen = cfg.server.listen_addr()?;
    tracing::info!(
        config = %path,
        buckets = cfg.metrics.latency_buckets.len(),
        request_id_header = %cfg.server.request_id_header,
        "configuration loaded"
    );

    let state = app_state::AppState::new(cfg)?;
    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| OpsError::Internal(format!("bind {listen} failed: {e}")))?;
    tracing::info!(%listen, "opsdemo starting");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| OpsError::Internal(format!("server failed: {e}")))?;

    tracing::info!("opsdemo stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
