// Web Push notification delivery

use crate::config::{PushConfig, PushMode};
use crate::db::repositories::user::UserRepository;
use crate::errors::{DatabaseError, NotificationError};
use crate::models::PushSubscription;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

lazy_static! {
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// Tag the browser uses to collapse repeated banners for the same notification
pub fn notification_tag(title: &str) -> String {
    format!(
        "reminder-{}",
        WHITESPACE_RUN.replace_all(title, "-").to_lowercase()
    )
}

/// Format an amount the way Indonesian Rupiah is written: `.` groups
/// thousands, `,` separates at most two decimals.
pub fn format_rupiah(amount: Decimal) -> String {
    let rounded = amount.round_dp(2).normalize();
    let text = rounded.abs().to_string();
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    match fraction {
        Some(fraction) => format!("{}{},{}", sign, grouped, fraction),
        None => format!("{}{}", sign, grouped),
    }
}

/// JSON document delivered to the service worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    pub url: String,
    pub tag: String,
}

impl PushPayload {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            tag: notification_tag(&title),
            title,
            body: body.into(),
            url: "/".to_string(),
        }
    }

    /// Reminder for a bill due today
    pub fn bill_reminder(name: &str, amount: Decimal) -> Self {
        Self::new(
            format!("Bill: {}", name),
            format!("Time to pay {}: Rp {}", name, format_rupiah(amount)),
        )
    }

    /// Confirmation after a transaction is logged
    pub fn transaction_saved(description: &str, amount: Decimal) -> Self {
        Self::new(
            "Transaction saved",
            format!("Logged {}: Rp {}", description, format_rupiah(amount)),
        )
    }
}

/// Trait for push delivery backends
#[async_trait]
pub trait PushNotifier: Send + Sync {
    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &PushPayload,
    ) -> Result<(), NotificationError>;
}

/// Notifier that only writes the payload to the log
#[derive(Debug, Default, Clone)]
pub struct LogPushNotifier;

#[async_trait]
impl PushNotifier for LogPushNotifier {
    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &PushPayload,
    ) -> Result<(), NotificationError> {
        info!(
            endpoint = %subscription.endpoint,
            title = %payload.title,
            tag = %payload.tag,
            "Push notification (log only)"
        );
        Ok(())
    }
}

#[derive(Serialize)]
struct GatewayRequest<'a> {
    subscription: &'a PushSubscription,
    payload: &'a PushPayload,
}

/// Hands notifications to a push relay that performs VAPID signing and
/// payload encryption
#[derive(Clone)]
pub struct HttpPushNotifier {
    gateway_url: String,
    gateway_key: Option<String>,
    client: reqwest::Client,
}

impl HttpPushNotifier {
    pub fn new(
        gateway_url: &str,
        gateway_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, NotificationError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            gateway_url: gateway_url.to_string(),
            gateway_key,
            client,
        })
    }
}

#[async_trait]
impl PushNotifier for HttpPushNotifier {
    #[instrument(skip_all, fields(title = %payload.title))]
    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &PushPayload,
    ) -> Result<(), NotificationError> {
        if subscription.endpoint.is_empty() {
            return Err(NotificationError::InvalidSubscription(
                "subscription endpoint is empty".to_string(),
            ));
        }

        let mut request = self
            .client
            .post(&self.gateway_url)
            .json(&GatewayRequest {
                subscription,
                payload,
            });
        if let Some(key) = &self.gateway_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::GatewayRejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status = status.as_u16(), "Push gateway accepted notification");
        Ok(())
    }
}

/// Build the configured push backend
pub fn build_push_notifier(
    config: &PushConfig,
) -> Result<Arc<dyn PushNotifier>, NotificationError> {
    match config.mode {
        PushMode::Log => Ok(Arc::new(LogPushNotifier)),
        PushMode::Http => {
            let gateway_url = config.gateway_url.as_deref().ok_or_else(|| {
                NotificationError::GatewayRequestFailed(
                    "push.gateway_url is not configured".to_string(),
                )
            })?;
            let notifier = HttpPushNotifier::new(
                gateway_url,
                config.gateway_key.clone(),
                Duration::from_secs(config.timeout_seconds),
            )?;
            Ok(Arc::new(notifier))
        }
    }
}

/// Where a user's push subscription is stored
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn find_push_subscription(
        &self,
        user_id: Uuid,
    ) -> Result<Option<PushSubscription>, DatabaseError>;
}

#[async_trait]
impl SubscriptionStore for UserRepository {
    async fn find_push_subscription(
        &self,
        user_id: Uuid,
    ) -> Result<Option<PushSubscription>, DatabaseError> {
        UserRepository::find_push_subscription(self, user_id).await
    }
}

/// Outcome of a notification attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    NoSubscription,
}

/// Resolves a user's subscription and dispatches through the configured backend
#[derive(Clone)]
pub struct NotificationService {
    subscriptions: Arc<dyn SubscriptionStore>,
    notifier: Arc<dyn PushNotifier>,
}

impl NotificationService {
    pub fn new(subscriptions: Arc<dyn SubscriptionStore>, notifier: Arc<dyn PushNotifier>) -> Self {
        Self {
            subscriptions,
            notifier,
        }
    }

    #[instrument(skip(self, payload), fields(title = %payload.title))]
    pub async fn notify_user(
        &self,
        user_id: Uuid,
        payload: &PushPayload,
    ) -> Result<Delivery, NotificationError> {
        let Some(subscription) = self.subscriptions.find_push_subscription(user_id).await? else {
            debug!(user_id = %user_id, "User has no push subscription");
            return Ok(Delivery::NoSubscription);
        };

        self.notifier.send(&subscription, payload).await?;
        Ok(Delivery::Sent)
    }

    /// Fire-and-forget variant used on request paths. Failures are logged.
    pub fn notify_user_in_background(&self, user_id: Uuid, payload: PushPayload) {
        let service = self.clone();
        tokio::spawn(async move {
            if let Err(e) = service.notify_user(user_id, &payload).await {
                warn!(user_id = %user_id, error = %e, "Background push notification failed");
            }
        });
    }
}
