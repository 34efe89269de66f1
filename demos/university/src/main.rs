//! University enrollment HTTP server.
//!
//! Composition root: configuration, tracing, metrics exporter, mediator
//! registry, router, then serve until Ctrl+C or SIGTERM.

use anyhow::Context;
use mediator_runtime::{MediatorConfig, MetricsServer};
use mediator_web::{AppState, WebConfig, build_router, init_tracing, metrics_router};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use university::school::SchoolStore;
use university::{api, ensure_routed, mediator_builder};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let web_config = WebConfig::from_env().context("invalid web configuration")?;
    init_tracing(&web_config.log_filter)?;

    info!("Starting University enrollment server");

    let mediator_config = MediatorConfig::from_env().context("invalid mediator configuration")?;
    info!(
        bind_addr = %web_config.bind_addr,
        metrics_addr = ?web_config.metrics_addr,
        request_type_property = %mediator_config.request_type_property,
        slow_request_threshold_ms = mediator_config.slow_request_threshold_ms,
        "Configuration loaded"
    );
    if web_config.connection_string.is_some() {
        warn!("DATABASE_URL is set but the school store is in-memory; ignoring it");
    }

    // Metrics exporter, served on its own listener
    if let Some(metrics_addr) = web_config.metrics_addr {
        let mut server = MetricsServer::new(metrics_addr);
        server.start()?;
        let listener = tokio::net::TcpListener::bind(metrics_addr).await?;
        info!(address = %metrics_addr, "Metrics endpoint listening");
        let app = metrics_router(Arc::new(server));
        tokio::spawn(async move {
            if let Err(error) = axum::serve(listener, app).await {
                warn!(%error, "metrics endpoint stopped");
            }
        });
    }

    // Registry: a missing handler is a startup failure, never a request failure
    let mediator = Arc::new(mediator_builder(mediator_config).build()?);
    ensure_routed(&mediator)?;
    info!(request_types = ?mediator.request_types(), "Mediator ready");

    let store = SchoolStore::new();
    let state = AppState::new(mediator, move || store.context());
    let app = build_router(api::routes(), state);

    let listener = tokio::net::TcpListener::bind(web_config.bind_addr).await?;
    info!(address = %web_config.bind_addr, "Server listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            warn!(%error, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            },
            Err(error) => {
                warn!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
