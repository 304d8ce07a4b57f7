//! Error types for catalog validation

/// Catalog shape errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// Same logical name declared twice
    #[error("duplicate {what} '{name}'")]
    Duplicate { what: &'static str, name: String },

    /// Lookup attributes form a cycle between entities
    #[error("lookup dependency cycle among: {0:?}")]
    DependencyCycle(Vec<String>),

    /// Definition unusable as declared
    #[error("invalid definition for '{name}': {message}")]
    Invalid { name: String, message: String },
}

impl CatalogError {
    /// Create duplicate entity error
    pub fn duplicate_entity(name: impl Into<String>) -> Self {
        Self::Duplicate {
            what: "entity",
            name: name.into(),
        }
    }

    /// Create duplicate attribute error
    pub fn duplicate_attribute(name: impl Into<String>) -> Self {
        Self::Duplicate {
            what: "attribute",
            name: name.into(),
        }
    }

    /// Create invalid definition error
    pub fn invalid(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            name: name.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_error_display() {
        let err = CatalogError::duplicate_entity("acme_batch");
        assert_eq!(err.to_string(), "duplicate entity 'acme_batch'");

        let err = CatalogError::DependencyCycle(vec!["a".into(), "b".into()]);
        assert!(err.to_string().contains("cycle"));
    }
}
