// Bootstrap utilities shared by the api and scheduler binaries

use crate::config::Settings;
use crate::db::repositories::UserRepository;
use crate::db::DbPool;
use crate::notification::{build_push_notifier, NotificationService};
use crate::schedule::DailySchedule;
use crate::scheduler::{BillReminderEngine, PostgresReminderSource};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Connect the database pool and apply pending migrations when enabled
#[tracing::instrument(skip(settings))]
pub async fn init_database_pool(settings: &Settings) -> Result<DbPool> {
    info!("Initializing database pool");

    let db_pool = DbPool::new(&settings.database)
        .await
        .context("Failed to initialize database pool")?;

    if settings.database.run_migrations {
        db_pool
            .run_migrations()
            .await
            .context("Failed to run database migrations")?;
        info!("Database migrations applied");
    }

    info!("Database pool initialized");
    Ok(db_pool)
}

/// Build the push notification service for the configured delivery mode
#[tracing::instrument(skip(settings, db_pool))]
pub fn init_notification_service(settings: &Settings, db_pool: DbPool) -> Result<NotificationService> {
    let notifier =
        build_push_notifier(&settings.push).context("Failed to initialize push notifier")?;

    info!(mode = ?settings.push.mode, "Push notification service initialized");
    Ok(NotificationService::new(
        Arc::new(UserRepository::new(db_pool)),
        notifier,
    ))
}

/// Build the bill reminder engine from the scheduler settings
#[tracing::instrument(skip(settings, db_pool, notifications))]
pub fn init_reminder_engine(
    settings: &Settings,
    db_pool: DbPool,
    notifications: NotificationService,
) -> Result<BillReminderEngine> {
    let schedule = DailySchedule::new(&settings.scheduler.cron, &settings.scheduler.timezone)
        .context("Invalid bill reminder schedule")?;

    info!(
        cron = %settings.scheduler.cron,
        timezone = %settings.scheduler.timezone,
        "Bill reminder engine initialized"
    );
    Ok(BillReminderEngine::new(
        schedule,
        Arc::new(PostgresReminderSource::new(db_pool)),
        notifications,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PushMode;

    fn lazy_pool(settings: &Settings) -> DbPool {
        DbPool::connect_lazy(&settings.database).expect("lazy pool")
    }

    #[tokio::test]
    async fn test_init_reminder_engine_with_defaults() {
        let settings = Settings::default();
        let pool = lazy_pool(&settings);
        let notifications = init_notification_service(&settings, pool.clone()).unwrap();

        assert!(init_reminder_engine(&settings, pool, notifications).is_ok());
    }

    #[tokio::test]
    async fn test_init_reminder_engine_rejects_bad_timezone() {
        let mut settings = Settings::default();
        settings.scheduler.timezone = "Mars/Olympus".to_string();
        let pool = lazy_pool(&settings);
        let notifications = init_notification_service(&settings, pool.clone()).unwrap();

        assert!(init_reminder_engine(&settings, pool, notifications).is_err());
    }

    #[tokio::test]
    async fn test_http_push_mode_requires_gateway() {
        let mut settings = Settings::default();
        settings.push.mode = PushMode::Http;
        let pool = lazy_pool(&settings);

        assert!(init_notification_service(&settings, pool).is_err());
    }
}
