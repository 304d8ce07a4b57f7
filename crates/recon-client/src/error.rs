//! Error types for the store client
//!
//! Only transport-level problems are errors here. A non-2xx answer from the
//! store is an ordinary [`StoreResponse`](crate::StoreResponse) that the
//! caller inspects.

/// Transport failures talking to the store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Connection, TLS or protocol failure
    #[error("network error calling {path}: {message}")]
    Network { path: String, message: String },

    /// Request exceeded the configured per-call timeout
    #[error("request to {path} timed out after {timeout_secs}s")]
    Timeout { path: String, timeout_secs: u64 },

    /// Bearer credential could not be obtained
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// Base URL or path could not be joined into a valid URL
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Response body could not be read
    #[error("failed to read response from {path}: {message}")]
    Decode { path: String, message: String },
}

impl StoreError {
    /// Create network error for path
    pub fn network(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create timeout error for path
    pub fn timeout(path: impl Into<String>, timeout_secs: u64) -> Self {
        Self::Timeout {
            path: path.into(),
            timeout_secs,
        }
    }

    /// Check if the error came from the credential provider
    #[inline]
    #[must_use]
    pub fn is_token(&self) -> bool {
        matches!(self, Self::Token(_))
    }

    /// Check if the error was a timeout
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Credential provider failures
#[derive(Debug, Clone, thiserror::Error)]
pub enum TokenError {
    /// No credential configured
    #[error("no credential available for scopes {0:?}")]
    Unavailable(Vec<String>),

    /// Provider-specific failure
    #[error("credential provider failed: {0}")]
    Provider(String),
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required value missing
    #[error("missing configuration value: {0}")]
    Missing(&'static str),

    /// Value present but unusable
    #[error("invalid configuration value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Result type alias for store calls
pub type StoreResult<T> = Result<T, StoreError>;
