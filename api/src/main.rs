use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;

mod handlers;
mod middleware;
mod routes;
mod state;

use common::bootstrap::{init_database_pool, init_notification_service, init_reminder_engine};
use common::config::Settings;
use common::identity::build_identity_provider;
use common::schedule::parse_timezone;
use common::scheduler::Scheduler;
use common::telemetry::{init_logging, install_metrics_recorder, shutdown_tracer};
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Settings::load().context("Failed to load configuration")?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    init_logging(
        &config.observability.log_level,
        config.observability.tracing_endpoint.as_deref(),
    )?;

    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        "Starting Budget Buddy API server"
    );

    let metrics_handle = install_metrics_recorder()?;
    let db_pool = init_database_pool(&config).await?;
    let notifications = init_notification_service(&config, db_pool.clone())?;
    let identity: Arc<dyn common::identity::IdentityProvider> = Arc::from(
        build_identity_provider(&config.identity).context("Failed to build identity provider")?,
    );
    let timezone = parse_timezone(&config.scheduler.timezone)?;

    // Bill reminders run in-process unless a standalone scheduler is deployed
    let reminder_engine = if config.scheduler.embedded {
        let engine = Arc::new(init_reminder_engine(
            &config,
            db_pool.clone(),
            notifications.clone(),
        )?);
        let runner = engine.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = runner.start().await {
                tracing::error!(error = %e, "Bill reminder scheduler stopped with error");
            }
        });
        Some((engine, handle))
    } else {
        tracing::info!("Embedded bill reminder scheduler disabled");
        None
    };

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    let state = AppState::new(
        db_pool.clone(),
        config,
        notifications,
        identity,
        timezone,
        Some(metrics_handle),
    );
    let app = routes::create_router(state);

    tracing::info!(addr = %addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some((engine, handle)) = reminder_engine {
        if let Err(e) = engine.stop().await {
            tracing::error!(error = %e, "Error stopping bill reminder scheduler");
        }
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "Bill reminder task panicked");
        }
    }

    db_pool.close().await;
    shutdown_tracer();
    tracing::info!("API server stopped");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }

    tracing::info!("Initiating graceful shutdown");
}
