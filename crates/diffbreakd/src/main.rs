//! diffbreakd entry point.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use diffbreak_core::{init_tracing, Metrics};
use diffbreakd::config::Config;
use diffbreakd::{router, AppState};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    config.validate()?;
    init_tracing(config.log_format(), config.log_level());

    let metrics = Arc::new(Metrics::new());
    let state = Arc::new(AppState::from_config(&config, metrics.clone())?);
    let app = router(state, &config.allowed_origin)?;

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(
        addr = %addr,
        llm = %config.llm_url,
        model = %config.model,
        version = diffbreak_core::VERSION,
        "diffbreakd listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    metrics.flush();
    info!("diffbreakd stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
