//! Engine configuration
//!
//! Loaded from TOML with environment overrides:
//!
//! ```toml
//! publisher_prefix = "acme"
//! max_write_attempts = 5
//!
//! [store]
//! base_url = "https://org.example.com"
//!
//! [[roles]]
//! role = "documents"
//! suffixes = ["batchdocument", "document"]
//! default_collection = "acme_documents"
//! ```

use crate::app;
use crate::error::{EngineError, EngineResult};
use recon_catalog::Labels;
use recon_client::{ConfigError, StoreConfig};
use recon_resolve::{RoleBindings, DEFAULT_CAPACITY};
use recon_write::{DEFAULT_CONCURRENCY, DEFAULT_MAX_ATTEMPTS};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Store connection
    pub store: StoreConfig,
    /// Publisher prefix of the application's own entities
    pub publisher_prefix: String,
    /// Language code for metadata labels
    pub language_code: u32,
    /// Cap on network writes per record
    pub max_write_attempts: u32,
    /// Record writes in flight during batch writes
    pub write_concurrency: usize,
    /// Entries per schema cache map
    pub cache_capacity: u64,
    /// Ensure a role's entity before its first write in a session
    pub ensure_before_write: bool,
    /// Role bindings; empty means the application defaults
    #[serde(skip_serializing_if = "RoleBindings::is_empty")]
    pub roles: RoleBindings,
}

impl EngineConfig {
    /// Create default configuration for a store
    #[inline]
    #[must_use]
    pub fn new(store: StoreConfig) -> Self {
        Self {
            store,
            ..Self::default()
        }
    }

    /// With publisher prefix
    #[inline]
    #[must_use]
    pub fn with_publisher_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.publisher_prefix = prefix.into();
        self
    }

    /// With label language code
    #[inline]
    #[must_use]
    pub fn with_language_code(mut self, language_code: u32) -> Self {
        self.language_code = language_code;
        self
    }

    /// With attempt cap per record
    #[inline]
    #[must_use]
    pub fn with_max_write_attempts(mut self, attempts: u32) -> Self {
        self.max_write_attempts = attempts;
        self
    }

    /// With batch write concurrency
    #[inline]
    #[must_use]
    pub fn with_write_concurrency(mut self, concurrency: usize) -> Self {
        self.write_concurrency = concurrency;
        self
    }

    /// With schema cache capacity
    #[inline]
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Enable or disable ensure-before-write
    #[inline]
    #[must_use]
    pub fn with_ensure_before_write(mut self, enabled: bool) -> Self {
        self.ensure_before_write = enabled;
        self
    }

    /// With explicit role bindings
    #[inline]
    #[must_use]
    pub fn with_roles(mut self, roles: RoleBindings) -> Self {
        self.roles = roles;
        self
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// `EngineError::ConfigFile` if the text is not a valid configuration
    pub fn from_toml_str(text: &str) -> EngineResult<Self> {
        toml::from_str(text).map_err(|e| EngineError::config_file("<inline>", e.to_string()))
    }

    /// Read from a TOML file
    ///
    /// # Errors
    /// `EngineError::ConfigFile` if the file cannot be read or parsed
    pub fn from_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        let text = std::fs::read_to_string(path)
            .map_err(|e| EngineError::config_file(&shown, e.to_string()))?;
        toml::from_str(&text).map_err(|e| EngineError::config_file(shown, e.to_string()))
    }

    /// Override fields from the environment where set
    ///
    /// Reads `RECON_PUBLISHER_PREFIX`, `RECON_WRITE_CONCURRENCY` and the
    /// store variables.
    ///
    /// # Errors
    /// `ConfigError::Invalid` for a value that does not parse
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.store.apply_env()?;
        if let Ok(prefix) = std::env::var("RECON_PUBLISHER_PREFIX") {
            self.publisher_prefix = prefix;
        }
        if let Ok(raw) = std::env::var("RECON_WRITE_CONCURRENCY") {
            self.write_concurrency = raw.parse().map_err(|e| ConfigError::Invalid {
                key: "RECON_WRITE_CONCURRENCY",
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
        self.store.validate()?;
        let prefix = &self.publisher_prefix;
        if prefix.is_empty()
            || !prefix.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(ConfigError::Invalid {
                key: "publisher_prefix",
                message: format!("expected lowercase letters and digits, got '{prefix}'"),
            });
        }
        if self.max_write_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "max_write_attempts",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.write_concurrency == 0 {
            return Err(ConfigError::Invalid {
                key: "write_concurrency",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Labels for metadata payloads
    #[inline]
    #[must_use]
    pub fn labels(&self) -> Labels {
        Labels {
            language_code: self.language_code,
        }
    }

    /// Configured bindings, or the application defaults when none are set
    #[must_use]
    pub fn effective_bindings(&self) -> RoleBindings {
        if self.roles.is_empty() {
            app::default_bindings(&self.publisher_prefix)
        } else {
            self.roles.clone()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            publisher_prefix: app::DEFAULT_PREFIX.to_string(),
            language_code: Labels::default().language_code,
            max_write_attempts: DEFAULT_MAX_ATTEMPTS,
            write_concurrency: DEFAULT_CONCURRENCY,
            cache_capacity: DEFAULT_CAPACITY,
            ensure_before_write: false,
            roles: RoleBindings::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.publisher_prefix, "acme");
        assert_eq!(config.language_code, 1033);
        assert_eq!(config.max_write_attempts, 5);
        assert_eq!(config.write_concurrency, 5);
        assert!(!config.ensure_before_write);
        assert_eq!(config.effective_bindings().len(), 4);
    }

    #[test]
    fn parses_toml_with_roles() {
        let config = EngineConfig::from_toml_str(
            r#"
            publisher_prefix = "toba"
            max_write_attempts = 3

            [store]
            base_url = "https://org.example.com"
            timeout_secs = 10

            [[roles]]
            role = "documents"
            suffixes = ["batchdocument", "document"]
            default_collection = "toba_documents"
            "#,
        )
        .unwrap();

        assert_eq!(config.publisher_prefix, "toba");
        assert_eq!(config.max_write_attempts, 3);
        assert_eq!(config.write_concurrency, 5);
        assert_eq!(config.store.timeout_secs, 10);
        assert_eq!(config.store.api_path, "api/data/v9.2");
        let bindings = config.effective_bindings();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings.get("documents").unwrap().suffixes, vec!["batchdocument", "document"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = EngineConfig::from_toml_str("max_write_attempts = \"many\"").unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = EngineConfig::from_file("/nonexistent/recon.toml").unwrap_err();
        assert!(matches!(
            err,
            EngineError::ConfigFile { ref path, .. } if path == "/nonexistent/recon.toml"
        ));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let store = StoreConfig::new("https://org.example.com");
        assert!(EngineConfig::new(store.clone()).validate().is_ok());
        assert!(EngineConfig::new(store.clone()).with_publisher_prefix("").validate().is_err());
        assert!(EngineConfig::new(store.clone())
            .with_publisher_prefix("Acme_")
            .validate()
            .is_err());
        assert!(EngineConfig::new(store.clone()).with_max_write_attempts(0).validate().is_err());
        assert!(EngineConfig::new(store).with_write_concurrency(0).validate().is_err());
    }

    #[test]
    fn environment_overrides_prefix() {
        std::env::set_var("RECON_PUBLISHER_PREFIX", "envpfx");
        let mut config = EngineConfig::new(StoreConfig::new("https://org.example.com"));
        config.apply_env().unwrap();
        std::env::remove_var("RECON_PUBLISHER_PREFIX");

        assert_eq!(config.publisher_prefix, "envpfx");
        let bindings = config.effective_bindings();
        assert!(bindings.get("batches").unwrap().default_collection.starts_with("envpfx_"));
    }
}
