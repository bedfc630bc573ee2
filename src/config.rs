//! Application configuration module
//!
//! Handles loading and validating configuration from environment variables.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl From<ConfigError> for crate::error::AuthError {
    fn from(e: ConfigError) -> Self {
        crate::error::AuthError::Config(e.to_string())
    }
}

/// Remote API configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the store admin API, e.g. `http://localhost:5000/api/`
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("http://localhost:5000/api/").expect("valid default URL"),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Client preference store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path of the JSON preference file
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".storegate/prefs.json"),
        }
    }
}

/// Complete client settings
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub api: ApiConfig,
    pub store: StoreConfig,
}

impl Settings {
    /// Load settings from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore errors if file not found)
        let _ = dotenvy::dotenv();

        let defaults = ApiConfig::default();
        let base_url = match std::env::var("STOREGATE_API_URL") {
            Ok(raw) => Self::parse_base_url(&raw)?,
            Err(_) => defaults.base_url,
        };

        let timeout = std::env::var("STOREGATE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        let store = StoreConfig {
            path: std::env::var("STOREGATE_PREFS")
                .map(PathBuf::from)
                .unwrap_or_else(|_| StoreConfig::default().path),
        };

        Ok(Self {
            api: ApiConfig { base_url, timeout },
            store,
        })
    }

    /// Parse and normalize the API base URL. A trailing slash is required
    /// for relative endpoint joins to resolve under the API root.
    fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
        let mut text = raw.trim().to_string();
        if !text.ends_with('/') {
            text.push('/');
        }
        Url::parse(&text).map_err(|e| {
            ConfigError::InvalidValue(format!("STOREGATE_API_URL is not a valid URL: {}", e))
        })
    }
}
