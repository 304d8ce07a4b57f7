//! Role bindings
//!
//! A role is the application's name for a kind of record ("documents",
//! "recipients"). Its binding lists the logical-name suffixes to look up
//! and the collection to use when no deployment entity matches.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// How one role maps onto the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleBinding {
    /// Application role name
    pub role: String,
    /// Logical-name suffixes to look up, most specific first
    pub suffixes: Vec<String>,
    /// Collection identifier used when discovery finds nothing
    pub default_collection: String,
    /// Entity logical name behind the default collection, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_entity: Option<String>,
}

impl RoleBinding {
    /// Create binding
    pub fn new<I, S>(
        role: impl Into<String>,
        suffixes: I,
        default_collection: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            role: role.into(),
            suffixes: suffixes.into_iter().map(Into::into).collect(),
            default_collection: default_collection.into(),
            default_entity: None,
        }
    }

    /// With the entity logical name behind the default collection
    #[inline]
    #[must_use]
    pub fn with_default_entity(mut self, logical_name: impl Into<String>) -> Self {
        self.default_entity = Some(logical_name.into());
        self
    }
}

/// Bindings keyed by role, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<RoleBinding>", into = "Vec<RoleBinding>")]
pub struct RoleBindings {
    by_role: IndexMap<String, RoleBinding>,
}

impl RoleBindings {
    /// Create empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With binding; replaces an earlier binding of the same role
    #[must_use]
    pub fn with_binding(mut self, binding: RoleBinding) -> Self {
        self.insert(binding);
        self
    }

    /// Insert binding; replaces an earlier binding of the same role
    pub fn insert(&mut self, binding: RoleBinding) {
        self.by_role.insert(binding.role.clone(), binding);
    }

    /// Binding for role
    #[inline]
    #[must_use]
    pub fn get(&self, role: &str) -> Option<&RoleBinding> {
        self.by_role.get(role)
    }

    /// Bindings in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &RoleBinding> {
        self.by_role.values()
    }

    /// Number of bindings
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_role.len()
    }

    /// Whether no role is bound
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_role.is_empty()
    }
}

impl From<Vec<RoleBinding>> for RoleBindings {
    fn from(bindings: Vec<RoleBinding>) -> Self {
        bindings.into_iter().collect()
    }
}

impl From<RoleBindings> for Vec<RoleBinding> {
    fn from(bindings: RoleBindings) -> Self {
        bindings.by_role.into_values().collect()
    }
}

impl FromIterator<RoleBinding> for RoleBindings {
    fn from_iter<T: IntoIterator<Item = RoleBinding>>(iter: T) -> Self {
        let mut bindings = Self::new();
        for binding in iter {
            bindings.insert(binding);
        }
        bindings
    }
}
