//! Error types for the engine
//!
//! Wraps the per-crate errors so callers of the facade handle one type.
//! Write failures are not errors here: they come back as outcomes.

use recon_catalog::CatalogError;
use recon_client::{ConfigError, StoreError};
use recon_provision::EnsureError;
use recon_resolve::ResolveError;

/// Engine error type
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid or unreadable configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Configuration file could not be read or parsed
    #[error("configuration file {path}: {message}")]
    ConfigFile { path: String, message: String },

    /// Transport failure outside a write
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Entity or attribute could not be ensured
    #[error(transparent)]
    Ensure(#[from] EnsureError),

    /// Role or field resolution failed
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Catalog is inconsistent
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Role resolved to a collection whose entity is unknown
    #[error("no entity logical name known for role '{0}'")]
    NoEntityForRole(String),
}

impl EngineError {
    /// Create config-file error
    pub fn config_file(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigFile {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Check if the error is a configuration problem
    #[inline]
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_) | Self::ConfigFile { .. })
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_file_error_display() {
        let err = EngineError::config_file("recon.toml", "expected a table");
        assert_eq!(err.to_string(), "configuration file recon.toml: expected a table");
        assert!(err.is_config());
    }

    #[test]
    fn resolve_errors_are_transparent() {
        let err = EngineError::from(ResolveError::UnknownRole("invoices".into()));
        assert_eq!(err.to_string(), "no binding configured for role 'invoices'");
        assert!(!err.is_config());
    }
}
