// Password recovery through an external identity provider

use crate::config::{IdentityConfig, IdentityMode};
use crate::errors::IdentityError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Sends password reset emails on behalf of the API
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn send_password_reset(
        &self,
        email: &str,
        redirect_to: Option<&str>,
    ) -> Result<(), IdentityError>;
}

/// Provider that only logs the request. Used in development.
#[derive(Debug, Default, Clone)]
pub struct LogIdentityProvider;

#[async_trait]
impl IdentityProvider for LogIdentityProvider {
    #[instrument(skip(self, _email))]
    async fn send_password_reset(
        &self,
        _email: &str,
        redirect_to: Option<&str>,
    ) -> Result<(), IdentityError> {
        info!("Password reset requested (log-only identity provider)");
        Ok(())
    }
}

/// Supabase-compatible hosted auth (`POST {base_url}/auth/v1/recover`)
#[derive(Clone)]
pub struct HostedIdentityProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl HostedIdentityProvider {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        })
    }

    fn recover_url(&self) -> String {
        format!("{}/auth/v1/recover", self.base_url)
    }
}

#[async_trait]
impl IdentityProvider for HostedIdentityProvider {
    #[instrument(skip(self, email))]
    async fn send_password_reset(
        &self,
        email: &str,
        redirect_to: Option<&str>,
    ) -> Result<(), IdentityError> {
        let mut request = self
            .client
            .post(self.recover_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "email": email }));
        if let Some(redirect_to) = redirect_to {
            request = request.query(&[("redirect_to", redirect_to)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Identity provider rejected password reset");
            return Err(IdentityError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!("Password reset email dispatched");
        Ok(())
    }
}

/// Build the configured identity provider
pub fn build_identity_provider(
    config: &IdentityConfig,
) -> Result<Box<dyn IdentityProvider>, IdentityError> {
    match config.mode {
        IdentityMode::Log => Ok(Box::new(LogIdentityProvider)),
        IdentityMode::Hosted => {
            let base_url = config.base_url.as_deref().ok_or_else(|| {
                IdentityError::RequestFailed("identity.base_url is not configured".to_string())
            })?;
            let api_key = config.api_key.as_deref().unwrap_or_default();
            let provider = HostedIdentityProvider::new(
                base_url,
                api_key,
                Duration::from_secs(config.timeout_seconds),
            )?;
            Ok(Box::new(provider))
        }
    }
}
