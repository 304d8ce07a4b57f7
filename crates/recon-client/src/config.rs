//! Store connection configuration

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Where and how to reach the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Organisation root, e.g. `https://org.example.com`
    pub base_url: String,
    /// Versioned API path under the base URL
    pub api_path: String,
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
    /// Token scopes; empty means `<base_url>/.default`
    pub scopes: Vec<String>,
}

impl StoreConfig {
    /// Create configuration for base URL with defaults
    #[inline]
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// With API path
    #[inline]
    #[must_use]
    pub fn with_api_path(mut self, api_path: impl Into<String>) -> Self {
        self.api_path = api_path.into();
        self
    }

    /// With per-call timeout
    #[inline]
    #[must_use]
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Load from `RECON_BASE_URL`, `RECON_API_PATH`, `RECON_TIMEOUT_SECS`
    ///
    /// # Errors
    /// - `ConfigError::Missing` if `RECON_BASE_URL` is unset
    /// - `ConfigError::Invalid` if the timeout is not a number
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url =
            std::env::var("RECON_BASE_URL").map_err(|_| ConfigError::Missing("RECON_BASE_URL"))?;
        let mut config = Self::new(base_url);
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from the environment where set
    ///
    /// # Errors
    /// `ConfigError::Invalid` if `RECON_TIMEOUT_SECS` is not a number
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(url) = std::env::var("RECON_BASE_URL") {
            self.base_url = url;
        }
        if let Ok(path) = std::env::var("RECON_API_PATH") {
            self.api_path = path;
        }
        if let Ok(raw) = std::env::var("RECON_TIMEOUT_SECS") {
            self.timeout_secs = raw.parse().map_err(|e| ConfigError::Invalid {
                key: "RECON_TIMEOUT_SECS",
                message: format!("{e}"),
            })?;
        }
        Ok(())
    }

    /// Check that the configuration can be used
    ///
    /// # Errors
    /// `ConfigError` describing the first unusable value
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Missing("base_url"));
        }
        if !(self.base_url.starts_with("https://") || self.base_url.starts_with("http://")) {
            return Err(ConfigError::Invalid {
                key: "base_url",
                message: format!("expected http(s) url, got '{}'", self.base_url),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "timeout_secs",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Root of the data/metadata API, without trailing slash
    #[must_use]
    pub fn api_root(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.api_path.trim_matches('/')
        )
    }

    /// Scopes to request tokens for
    #[must_use]
    pub fn effective_scopes(&self) -> Vec<String> {
        if self.scopes.is_empty() {
            vec![format!("{}/.default", self.base_url.trim_end_matches('/'))]
        } else {
            self.scopes.clone()
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_path: "api/data/v9.2".to_string(),
            timeout_secs: 30,
            scopes: Vec::new(),
        }
    }
}
