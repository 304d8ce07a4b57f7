//! Error types for resolution

use recon_client::StoreError;

/// Errors from collection or attribute resolution
///
/// Cloneable so a failure shared by coalesced cache lookups can be handed
/// to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// Role has no binding
    #[error("no binding configured for role '{0}'")]
    UnknownRole(String),

    /// Entity lookup for a role failed in transport or was rejected
    #[error("entity lookup for role '{role}' (suffix '{suffix}') failed: {detail}")]
    Lookup {
        role: String,
        suffix: String,
        status: Option<u16>,
        detail: String,
    },

    /// Attribute listing failed
    #[error("could not list attributes of {entity}: {detail}")]
    Listing {
        entity: String,
        status: Option<u16>,
        detail: String,
    },
}

impl ResolveError {
    /// Create listing error from a transport failure
    pub fn transport(entity: impl Into<String>, err: &StoreError) -> Self {
        Self::Listing {
            entity: entity.into(),
            status: None,
            detail: err.to_string(),
        }
    }

    /// Create lookup error from a transport failure
    pub fn lookup_transport(
        role: impl Into<String>,
        suffix: impl Into<String>,
        err: &StoreError,
    ) -> Self {
        Self::Lookup {
            role: role.into(),
            suffix: suffix.into(),
            status: None,
            detail: err.to_string(),
        }
    }

    /// Check if the role was unknown
    #[inline]
    #[must_use]
    pub fn is_unknown_role(&self) -> bool {
        matches!(self, Self::UnknownRole(_))
    }
}

/// Result type alias for resolution
pub type ResolveResult<T> = Result<T, ResolveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_role_display() {
        let err = ResolveError::UnknownRole("documents".into());
        assert_eq!(err.to_string(), "no binding configured for role 'documents'");
        assert!(err.is_unknown_role());
    }

    #[test]
    fn transport_error_keeps_message() {
        let err = ResolveError::transport("acme_batch", &StoreError::timeout("x", 30));
        assert!(matches!(err, ResolveError::Listing { status: None, .. }));
        assert!(err.to_string().starts_with("could not list attributes of acme_batch"));
    }

    #[test]
    fn lookup_error_names_role_and_suffix() {
        let err = ResolveError::lookup_transport(
            "documents",
            "batchdocument",
            &StoreError::timeout("x", 30),
        );
        assert!(matches!(err, ResolveError::Lookup { status: None, .. }));
        assert!(err
            .to_string()
            .starts_with("entity lookup for role 'documents' (suffix 'batchdocument') failed"));
    }
}
