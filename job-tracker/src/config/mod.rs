//! Process configuration loaded from the environment.
//!
//! Everything here is read once at startup and handed to the services that
//! need it; nothing reads the environment after `AppConfig::from_env` returns.

use tracing::info;

use crate::api::auth_service::AuthConfig;
use crate::api::server::ApiServerConfig;
use crate::{Error, Result};

/// Default SQLite database location.
pub const DEFAULT_DATABASE_URL: &str = "sqlite:job-tracker.db?mode=rwc";

/// Default log directory.
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Database settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// SQLite connection URL
    pub url: String,
}

impl DatabaseConfig {
    pub fn from_env() -> Self {
        let url = env_non_empty("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        Self { url }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ApiServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub log_dir: String,
}

impl AppConfig {
    /// Load the full configuration from environment variables.
    ///
    /// Fails only when a required value (`JWT_SECRET`) is missing.
    pub fn from_env() -> Result<Self> {
        let auth = AuthConfig::from_env()?;
        let server = ApiServerConfig::from_env_or_default();
        let database = DatabaseConfig::from_env();
        let log_dir = env_non_empty("LOG_DIR").unwrap_or_else(|| DEFAULT_LOG_DIR.to_string());

        Ok(Self {
            server,
            database,
            auth,
            log_dir,
        })
    }

    /// Log the effective settings. Call once logging is initialized.
    pub fn log_summary(&self) {
        info!(
            bind_address = %self.server.bind_address,
            port = self.server.port,
            production = self.server.production,
            log_dir = %self.log_dir,
            access_token_expiration_secs = self.auth.access_token_expiration_secs,
            refresh_token_expiration_secs = self.auth.refresh_token_expiration_secs,
            "Configuration loaded"
        );
    }
}

/// Read an environment variable, treating blank values as unset.
pub(crate) fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read and parse an environment variable, falling back to `default`.
pub(crate) fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env_non_empty(key)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Read a required environment variable.
pub(crate) fn env_required(key: &str) -> Result<String> {
    env_non_empty(key).ok_or_else(|| Error::config(format!("{} must be set", key)))
}
