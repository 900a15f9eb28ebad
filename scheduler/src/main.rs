// Standalone bill reminder scheduler
//
// Runs the same reminder loop the API can embed, for deployments that keep
// reminders out of the API process. `--once` performs a single run for the
// current date and exits.

use anyhow::Context;
use chrono::Utc;
use common::bootstrap::{init_database_pool, init_notification_service, init_reminder_engine};
use common::config::Settings;
use common::scheduler::Scheduler;
use common::telemetry::{init_logging, init_metrics, shutdown_tracer};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let run_once = std::env::args().skip(1).any(|arg| arg == "--once");

    let settings = Settings::load().context("Failed to load configuration")?;
    settings
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    init_logging(
        &settings.observability.log_level,
        settings.observability.tracing_endpoint.as_deref(),
    )?;

    info!(
        cron = %settings.scheduler.cron,
        timezone = %settings.scheduler.timezone,
        run_once,
        "Starting Budget Buddy bill reminder scheduler"
    );

    let db_pool = init_database_pool(&settings).await?;
    let notifications = init_notification_service(&settings, db_pool.clone())?;
    let engine = Arc::new(init_reminder_engine(
        &settings,
        db_pool.clone(),
        notifications,
    )?);

    if run_once {
        let report = engine
            .run_once(Utc::now())
            .await
            .map_err(|e| anyhow::anyhow!("Bill reminder run failed: {}", e))?;
        info!(
            due = report.due,
            sent = report.sent,
            failed = report.failed,
            "One-shot bill reminder run finished"
        );
        db_pool.close().await;
        shutdown_tracer();
        return Ok(());
    }

    init_metrics(settings.observability.metrics_port)?;

    let engine_for_shutdown = engine.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        if let Err(e) = engine_for_shutdown.stop().await {
            error!(error = %e, "Error during scheduler shutdown");
        }
    });

    if let Err(e) = engine.start().await {
        error!(error = %e, "Scheduler error");
        return Err(anyhow::anyhow!("Scheduler stopped with error: {}", e));
    }

    db_pool.close().await;
    shutdown_tracer();
    info!("Scheduler stopped");
    Ok(())
}

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
        _ = ctrl_c => info!("Received Ctrl+C signal"),
        _ = terminate => info!("Received SIGTERM signal"),
    }
}
