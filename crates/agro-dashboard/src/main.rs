use std::net::SocketAddr;
use std::sync::Arc;

use agro_client::HttpDataSource;
use agro_config::AppConfig;
use agro_dashboard::session::Session;
use anyhow::{Context, Result};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    // Observability
    agro_obs::init("agrod");

    // Config
    let cfg = AppConfig::load().context("loading configuration")?;

    let source = HttpDataSource::new(
        &cfg.iot_base_url(),
        &cfg.history_base_url(),
        cfg.request_timeout(),
    )
    .context("building data source")?;
    let session = Session::load(cfg.session_flag_path());

    // Build app and state
    let (app, state) = agro_dashboard::build_app(Arc::new(source), session)?;
    let tasks = agro_dashboard::start_sync(
        &state,
        cfg.refresh_period(),
        cfg.history_refresh_period(),
    );

    // Start HTTP server
    let addr: SocketAddr = cfg
        .http_bind()
        .parse()
        .context("invalid HTTP bind address")?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, "HTTP server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    agro_dashboard::shutdown(&state);
    for task in tasks {
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "background task ended abnormally");
        }
    }
    tracing::info!("stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
