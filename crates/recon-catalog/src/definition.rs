//! Entity and attribute definitions
//!
//! Definitions describe what the application needs to exist remotely.
//! They are built once with consuming builders and never mutated after
//! being handed to the ensurer.

use serde::{Deserialize, Serialize};

/// Date-time interpretation for `DateTime` attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateTimeBehavior {
    /// Stored in UTC, shown in the user's time zone
    UserLocal,
    /// Stored and shown as entered
    TimeZoneIndependent,
}

impl DateTimeBehavior {
    /// Name used by the store's metadata API
    #[inline]
    #[must_use]
    pub fn metadata_value(self) -> &'static str {
        match self {
            Self::UserLocal => "UserLocal",
            Self::TimeZoneIndependent => "TimeZoneIndependent",
        }
    }
}

/// Semantic kind of an attribute
///
/// Once an attribute exists remotely its kind is never changed here;
/// mismatches are left for an operator to resolve.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeKind {
    /// Single-line text
    String { max_length: u32 },
    /// Whole number within bounds
    Integer { min: i32, max: i32 },
    /// Two-option yes/no
    Boolean,
    /// Calendar date without time
    DateOnly,
    /// Date with time
    DateTime { behavior: DateTimeBehavior },
    /// Text formatted as URL
    Url { max_length: u32 },
    /// Reference to a record of another entity
    Lookup { target: String },
}

impl AttributeKind {
    /// Text attribute with max length
    #[inline]
    #[must_use]
    pub fn string(max_length: u32) -> Self {
        Self::String { max_length }
    }

    /// Integer over the store's full range
    #[inline]
    #[must_use]
    pub fn integer() -> Self {
        Self::Integer {
            min: -2_147_483_648,
            max: 2_147_483_647,
        }
    }

    /// Integer within bounds
    #[inline]
    #[must_use]
    pub fn integer_between(min: i32, max: i32) -> Self {
        Self::Integer { min, max }
    }

    /// Date-time shown in the user's zone
    #[inline]
    #[must_use]
    pub fn date_time() -> Self {
        Self::DateTime {
            behavior: DateTimeBehavior::UserLocal,
        }
    }

    /// URL with max length
    #[inline]
    #[must_use]
    pub fn url(max_length: u32) -> Self {
        Self::Url { max_length }
    }

    /// Lookup to target entity
    #[inline]
    #[must_use]
    pub fn lookup(target: impl Into<String>) -> Self {
        Self::Lookup {
            target: target.into(),
        }
    }

    /// Lookup target, if this is a lookup
    #[inline]
    #[must_use]
    pub fn lookup_target(&self) -> Option<&str> {
        match self {
            Self::Lookup { target } => Some(target),
            _ => None,
        }
    }

    /// Short name for logs
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::String { .. } => "string",
            Self::Integer { .. } => "integer",
            Self::Boolean => "boolean",
            Self::DateOnly => "date",
            Self::DateTime { .. } => "datetime",
            Self::Url { .. } => "url",
            Self::Lookup { .. } => "lookup",
        }
    }
}

/// One attribute the application needs on an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSpec {
    /// Logical name, e.g. `acme_duedate`
    pub logical_name: String,
    /// Display label
    pub label: String,
    /// Semantic kind
    pub kind: AttributeKind,
}

impl AttributeSpec {
    /// Create attribute; every attribute is created optional
    #[must_use]
    pub fn new(
        logical_name: impl Into<String>,
        label: impl Into<String>,
        kind: AttributeKind,
    ) -> Self {
        Self {
            logical_name: logical_name.into(),
            label: label.into(),
            kind,
        }
    }
}

/// One entity the application needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpec {
    /// Stable logical name, e.g. `acme_batch`
    pub logical_name: String,
    /// Singular display name
    pub display_name: String,
    /// Plural display name
    pub display_plural: String,
    /// Logical name of the primary display attribute
    pub primary_attribute: String,
    /// Max length of the primary display attribute
    #[serde(default = "default_primary_length")]
    pub primary_max_length: u32,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Desired attributes, in the order they are ensured
    #[serde(default)]
    pub attributes: Vec<AttributeSpec>,
}

fn default_primary_length() -> u32 {
    200
}

impl EntitySpec {
    /// Create entity definition without attributes
    #[must_use]
    pub fn new(
        logical_name: impl Into<String>,
        display_name: impl Into<String>,
        display_plural: impl Into<String>,
        primary_attribute: impl Into<String>,
    ) -> Self {
        Self {
            logical_name: logical_name.into(),
            display_name: display_name.into(),
            display_plural: display_plural.into(),
            primary_attribute: primary_attribute.into(),
            primary_max_length: default_primary_length(),
            description: None,
            attributes: Vec::new(),
        }
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// With primary attribute length
    #[inline]
    #[must_use]
    pub fn with_primary_max_length(mut self, max_length: u32) -> Self {
        self.primary_max_length = max_length;
        self
    }

    /// Append attribute
    #[inline]
    #[must_use]
    pub fn with_attribute(mut self, attribute: AttributeSpec) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Lookup targets of this entity's attributes, in declaration order
    pub fn lookup_targets(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().filter_map(|a| a.kind.lookup_target())
    }

    /// Conventional collection name used when metadata does not report one
    #[must_use]
    pub fn conventional_collection(&self) -> String {
        let name = &self.logical_name;
        if name.ends_with('s')
            || name.ends_with('x')
            || name.ends_with("ch")
            || name.ends_with("sh")
        {
            format!("{name}es")
        } else if name.ends_with('y')
            && !name.ends_with("ay")
            && !name.ends_with("ey")
            && !name.ends_with("oy")
        {
            format!("{}ies", &name[..name.len() - 1])
        } else {
            format!("{name}s")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lookup_targets_in_order() {
        let entity = EntitySpec::new("acme_document", "Document", "Documents", "acme_name")
            .with_attribute(AttributeSpec::new(
                "acme_batch",
                "Batch",
                AttributeKind::lookup("acme_batch"),
            ))
            .with_attribute(AttributeSpec::new("acme_url", "Url", AttributeKind::url(500)))
            .with_attribute(AttributeSpec::new(
                "acme_owner",
                "Owner",
                AttributeKind::lookup("systemuser"),
            ));
        let targets: Vec<_> = entity.lookup_targets().collect();
        assert_eq!(targets, vec!["acme_batch", "systemuser"]);
    }

    #[test]
    fn conventional_collection_pluralises() {
        let plural = |n: &str| EntitySpec::new(n, "x", "xs", "name").conventional_collection();
        assert_eq!(plural("acme_batch"), "acme_batches");
        assert_eq!(plural("acme_document"), "acme_documents");
        assert_eq!(plural("acme_policy"), "acme_policies");
        assert_eq!(plural("acme_key"), "acme_keys");
        assert_eq!(plural("acme_business"), "acme_businesses");
    }

    #[test]
    fn kind_names() {
        assert_eq!(AttributeKind::integer().name(), "integer");
        assert_eq!(AttributeKind::date_time().name(), "datetime");
        assert_eq!(AttributeKind::lookup("x").lookup_target(), Some("x"));
        assert_eq!(AttributeKind::Boolean.lookup_target(), None);
    }
}
