// Configuration management with layered configuration (file, env)

use crate::schedule::{parse_cron_expression, parse_timezone};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub push: PushConfig,
    pub scheduler: SchedulerConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_seconds: u64,
    #[serde(default)]
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_hours: u64,
}

/// Hosted identity provider used for password recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub mode: IdentityMode,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub reset_redirect_url: Option<String>,
    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityMode {
    Log,
    Hosted,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            mode: IdentityMode::Log,
            base_url: None,
            api_key: None,
            reset_redirect_url: None,
            timeout_seconds: default_http_timeout(),
        }
    }
}

/// Push notification delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    pub mode: PushMode,
    pub gateway_url: Option<String>,
    pub gateway_key: Option<String>,
    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushMode {
    Log,
    Http,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            mode: PushMode::Log,
            gateway_url: None,
            gateway_key: None,
            timeout_seconds: default_http_timeout(),
        }
    }
}

fn default_http_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Run the bill reminder loop inside the API process
    pub embedded: bool,
    /// Six-field cron expression (seconds first)
    pub cron: String,
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub metrics_port: u16,
    pub tracing_endpoint: Option<String>,
}

impl Settings {
    /// Load configuration with layered precedence: defaults → file → env
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add local configuration (not committed to git)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port must be greater than 0".to_string());
        }

        if self.database.url.is_empty() {
            return Err("Database URL cannot be empty".to_string());
        }
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }

        if self.auth.jwt_secret.is_empty() {
            return Err("JWT secret cannot be empty".to_string());
        }
        if self.auth.jwt_expiration_hours == 0 {
            return Err("JWT expiration must be greater than 0 hours".to_string());
        }

        if self.identity.mode == IdentityMode::Hosted
            && (self.identity.base_url.is_none() || self.identity.api_key.is_none())
        {
            return Err(
                "Identity base_url and api_key are required when identity mode is 'hosted'"
                    .to_string(),
            );
        }

        if self.push.mode == PushMode::Http && self.push.gateway_url.is_none() {
            return Err("Push gateway_url is required when push mode is 'http'".to_string());
        }

        parse_cron_expression(&self.scheduler.cron).map_err(|e| e.to_string())?;
        parse_timezone(&self.scheduler.timezone).map_err(|e| e.to_string())?;

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/budget_buddy".to_string(),
                max_connections: 10,
                min_connections: 2,
                connect_timeout_seconds: 30,
                run_migrations: false,
            },
            auth: AuthConfig {
                jwt_secret: "change-me-in-production".to_string(),
                jwt_expiration_hours: 168,
            },
            identity: IdentityConfig::default(),
            push: PushConfig::default(),
            scheduler: SchedulerConfig {
                embedded: true,
                cron: "0 0 8 * * *".to_string(),
                timezone: "Asia/Jakarta".to_string(),
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                metrics_port: 9090,
                tracing_endpoint: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validation_catches_empty_database_url() {
        let mut settings = Settings::default();
        settings.database.url = String::new();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_zero_port() {
        let mut settings = Settings::default();
        settings.server.port = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_http_push_without_gateway() {
        let mut settings = Settings::default();
        settings.push.mode = PushMode::Http;
        settings.push.gateway_url = None;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_hosted_identity_without_key() {
        let mut settings = Settings::default();
        settings.identity.mode = IdentityMode::Hosted;
        settings.identity.base_url = Some("https://auth.example.com".to_string());
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_bad_cron_and_timezone() {
        let mut settings = Settings::default();
        settings.scheduler.cron = "every morning".to_string();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.scheduler.timezone = "Mars/Olympus_Mons".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_from_missing_directory_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = Settings::load_from_path(dir.path()).expect("defaults should load");
        assert_eq!(settings.server.port, 5000);
        assert_eq!(settings.scheduler.cron, "0 0 8 * * *");
        assert_eq!(settings.push.mode, PushMode::Log);
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("default.toml"),
            "[server]\nport = 8081\n\n[scheduler]\ntimezone = \"Asia/Makassar\"\n",
        )
        .expect("write config");

        let settings = Settings::load_from_path(dir.path()).expect("config should load");
        assert_eq!(settings.server.port, 8081);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.scheduler.timezone, "Asia/Makassar");
    }
}
