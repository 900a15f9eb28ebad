use chrono_tz::Tz;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use common::auth::JwtService;
use common::config::Settings;
use common::db::DbPool;
use common::identity::IdentityProvider;
use common::notification::NotificationService;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub config: Arc<Settings>,
    pub jwt: JwtService,
    pub notifications: NotificationService,
    pub identity: Arc<dyn IdentityProvider>,
    /// Zone that "today" and "this month" are evaluated in
    pub timezone: Tz,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(
        db_pool: DbPool,
        config: Settings,
        notifications: NotificationService,
        identity: Arc<dyn IdentityProvider>,
        timezone: Tz,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        let jwt = JwtService::new(&config.auth.jwt_secret, config.auth.jwt_expiration_hours);

        Self {
            db_pool,
            config: Arc::new(config),
            jwt,
            notifications,
            identity,
            timezone,
            metrics,
        }
    }
}
