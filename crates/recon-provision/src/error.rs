//! Error types for provisioning
//!
//! Covers:
//! - Permission problems (never retried with another payload shape)
//! - Entity creation exhausting every strategy
//! - Attribute creation rejected by the store
//! - Unexpected metadata probe answers
//! - Transport failures from the client

use recon_client::StoreError;

/// Errors from ensuring one entity or attribute
#[derive(Debug, thiserror::Error)]
pub enum EnsureError {
    /// 401/403 from the store
    #[error("permission denied during {step} (HTTP {status}): {detail}")]
    PermissionDenied {
        step: String,
        status: u16,
        detail: String,
    },

    /// Every entity creation strategy was rejected
    #[error("could not create entity {entity}: {detail}")]
    CreationFailed {
        entity: String,
        status: Option<u16>,
        detail: String,
    },

    /// Attribute creation rejected
    #[error("could not create attribute {entity}.{attribute} (HTTP {status}): {detail}")]
    AttributeFailed {
        entity: String,
        attribute: String,
        status: u16,
        detail: String,
    },

    /// Metadata probe answered with neither found nor not-found
    #[error("metadata probe for {target} failed (HTTP {status}): {detail}")]
    Probe {
        target: String,
        status: u16,
        detail: String,
    },

    /// Transport failure
    #[error("store unreachable: {0}")]
    Store(#[from] StoreError),
}

impl EnsureError {
    /// Create permission error for step
    pub fn permission_denied(
        step: impl Into<String>,
        status: u16,
        detail: impl Into<String>,
    ) -> Self {
        Self::PermissionDenied {
            step: step.into(),
            status,
            detail: detail.into(),
        }
    }

    /// Check if the error is a permission problem
    #[inline]
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }

    /// HTTP status behind the error, if any
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::PermissionDenied { status, .. }
            | Self::AttributeFailed { status, .. }
            | Self::Probe { status, .. } => Some(*status),
            Self::CreationFailed { status, .. } => *status,
            Self::Store(_) => None,
        }
    }
}

/// Result type alias for ensure operations
pub type EnsureResult<T> = Result<T, EnsureError>;
