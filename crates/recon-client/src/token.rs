//! Bearer credential providers
//!
//! Authentication itself lives outside this workspace. The host supplies a
//! [`TokenProvider`]; [`StaticToken`] covers tests and the CLI.

use crate::error::TokenError;
use async_trait::async_trait;

/// Source of bearer tokens for the store
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Obtain a bearer token valid for the given scopes
    async fn token(&self, scopes: &[String]) -> Result<String, TokenError>;
}

/// Fixed token, never refreshed
#[derive(Clone)]
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    /// Create provider around an already-issued token
    #[inline]
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticToken")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self, scopes: &[String]) -> Result<String, TokenError> {
        if self.token.is_empty() {
            return Err(TokenError::Unavailable(scopes.to_vec()));
        }
        Ok(self.token.clone())
    }
}
