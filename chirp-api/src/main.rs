//! chirp-api - Bird sound analysis service
//!
//! Accepts audio uploads over HTTP and returns BirdNET species detections.
//! The engine is initialized in the background; `/` and `/health` answer
//! immediately, `/analyze` returns 503 until the engine is ready.

use anyhow::{Context, Result};
use chirp_api::config::Args;
use chirp_api::engine::{Analyzer, BirdnetCli, EngineHandle};
use chirp_api::{build_router, AppState};
use chirp_common::config::API_TITLE;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.resolve().context("Failed to resolve configuration")?;

    // RUST_LOG wins over LOG_LEVEL/DEBUG when set
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_filter())),
        )
        .init();

    info!(
        "Starting {} (chirp-api) v{} [{}] built {} ({})",
        API_TITLE,
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Model cache: {}", config.analysis.model_cache_dir.display());
    info!("Staging directory: {}", config.upload.staging_dir.display());

    let shutdown = CancellationToken::new();

    // Engine construction may take minutes; serve status queries meanwhile
    let engine = EngineHandle::new();
    let analysis_config = config.analysis.clone();
    let init = engine.spawn_initialization(move || {
        BirdnetCli::initialize(&analysis_config).map(|cli| Arc::new(cli) as Arc<dyn Analyzer>)
    });

    let init_watch = tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            let outcome = match init.await {
                Ok(Ok(())) => return Ok(()),
                Ok(Err(e)) => anyhow::anyhow!("Failed to initialize analyzer: {}", e),
                Err(e) => anyhow::anyhow!("Analyzer initialization task failed: {}", e),
            };
            error!("{:#}", outcome);
            shutdown.cancel();
            Err(outcome)
        }
    });

    let state = AppState::new(engine, &config).context("Failed to build application state")?;
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await
        .context("Server error")?;

    // A broken engine is fatal: report it as the process exit status
    if shutdown.is_cancelled() {
        init_watch.await.context("Initialization watcher panicked")??;
    } else {
        init_watch.abort();
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Resolve on Ctrl+C, SIGTERM, or engine initialization failure
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
        _ = shutdown.cancelled() => {
            info!("Analyzer initialization failed, shutting down");
        },
    }
}
