//! Write failures
//!
//! A failed write is classified by what went wrong so the caller can
//! decide whether to surface, log or abandon it.

use recon_client::{StatusClass, StoreError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a write failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// 401/403
    PermissionDenied,
    /// 404 on the collection or record
    NotFound,
    /// 400 naming a field that was already removed or is not in the payload
    BadPayload,
    /// 400 whose diagnostic names no field
    BadPayloadUnidentifiable,
    /// 5xx, 429, transport failure or timeout
    ServerError,
    /// 409/412
    Conflict,
    /// Caller cancelled before the store answered
    Cancelled,
    /// Attempt cap reached while the store kept naming new fields
    AttemptsExhausted,
}

impl FailureKind {
    /// Kind for a non-success, non-400 status
    #[must_use]
    pub fn for_status(class: StatusClass) -> Self {
        match class {
            StatusClass::PermissionDenied => Self::PermissionDenied,
            StatusClass::NotFound => Self::NotFound,
            StatusClass::Conflict => Self::Conflict,
            StatusClass::BadPayload => Self::BadPayload,
            StatusClass::Success
            | StatusClass::RateLimited
            | StatusClass::ServerError
            | StatusClass::Other => Self::ServerError,
        }
    }

    /// Short machine name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission_denied",
            Self::NotFound => "not_found",
            Self::BadPayload => "bad_payload",
            Self::BadPayloadUnidentifiable => "bad_payload_unidentifiable",
            Self::ServerError => "server_error",
            Self::Conflict => "conflict",
            Self::Cancelled => "cancelled",
            Self::AttemptsExhausted => "attempts_exhausted",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

/// A write that did not succeed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind} after {attempts} attempt(s){}: {detail}", status_suffix(.status))]
pub struct WriteFailure {
    /// Classification
    pub kind: FailureKind,
    /// Last HTTP status, absent for transport failures and cancellation
    pub status: Option<u16>,
    /// Last diagnostic text
    pub detail: String,
    /// Network writes issued
    pub attempts: u32,
    /// Fields removed before giving up
    pub removed: Vec<String>,
}

impl WriteFailure {
    /// Create failure
    pub fn new(kind: FailureKind, status: Option<u16>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            detail: detail.into(),
            attempts: 0,
            removed: Vec::new(),
        }
    }

    /// Failure from a transport error
    #[must_use]
    pub fn transport(err: &StoreError) -> Self {
        Self::new(FailureKind::ServerError, None, err.to_string())
    }

    /// Failure from cancellation
    #[must_use]
    pub fn cancelled() -> Self {
        Self::new(FailureKind::Cancelled, None, "write cancelled by caller")
    }

    /// With attempt count and removed fields
    #[inline]
    #[must_use]
    pub fn after(mut self, attempts: u32, removed: Vec<String>) -> Self {
        self.attempts = attempts;
        self.removed = removed;
        self
    }

    /// Check if the failure is a permission problem
    #[inline]
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        self.kind == FailureKind::PermissionDenied
    }

    /// Check if the caller cancelled
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.kind == FailureKind::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_status() {
        let failure = WriteFailure::new(FailureKind::PermissionDenied, Some(403), "no privilege")
            .after(1, vec![]);
        assert_eq!(
            failure.to_string(),
            "permission_denied after 1 attempt(s) (HTTP 403): no privilege"
        );
        assert!(failure.is_permission_denied());
    }

    #[test]
    fn transport_failure_is_server_error() {
        let failure = WriteFailure::transport(&StoreError::timeout("acme_documents", 30));
        assert_eq!(failure.kind, FailureKind::ServerError);
        assert_eq!(failure.status, None);
        assert!(failure.to_string().starts_with("server_error after 0 attempt(s): "));
    }

    #[test]
    fn status_classes_map_to_kinds() {
        assert_eq!(FailureKind::for_status(StatusClass::of(401)), FailureKind::PermissionDenied);
        assert_eq!(FailureKind::for_status(StatusClass::of(404)), FailureKind::NotFound);
        assert_eq!(FailureKind::for_status(StatusClass::of(412)), FailureKind::Conflict);
        assert_eq!(FailureKind::for_status(StatusClass::of(429)), FailureKind::ServerError);
        assert_eq!(FailureKind::for_status(StatusClass::of(502)), FailureKind::ServerError);
    }
}
