//! Records described by field role
//!
//! A [`WriteRecord`] names what the caller wants written without knowing
//! this deployment's attribute names. The engine resolves it into a
//! [`WritePayload`](recon_write::WritePayload) right before the write.

use recon_catalog::schema_name;
use recon_resolve::FieldQuery;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Value for one field of a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordValue {
    /// Plain JSON value
    Value(Value),
    /// Reference to a record of another role
    Lookup {
        /// Role of the referenced record
        target_role: String,
        /// Identifier of the referenced record
        id: String,
    },
}

impl RecordValue {
    /// Create lookup value
    pub fn lookup(target_role: impl Into<String>, id: impl Into<String>) -> Self {
        Self::Lookup {
            target_role: target_role.into(),
            id: id.into(),
        }
    }
}

/// One record to write, keyed by field query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriteRecord {
    fields: Vec<(FieldQuery, RecordValue)>,
}

impl WriteRecord {
    /// Create empty record
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a plain field
    #[must_use]
    pub fn with(mut self, query: FieldQuery, value: impl Into<Value>) -> Self {
        self.fields.push((query, RecordValue::Value(value.into())));
        self
    }

    /// With a lookup field
    #[must_use]
    pub fn with_lookup(
        mut self,
        query: FieldQuery,
        target_role: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        self.fields.push((query, RecordValue::lookup(target_role, id)));
        self
    }

    /// Append field
    pub fn push(&mut self, query: FieldQuery, value: RecordValue) {
        self.fields.push((query, value));
    }

    /// Fields in insertion order
    pub fn fields(&self) -> impl Iterator<Item = (&FieldQuery, &RecordValue)> {
        self.fields.iter().map(|(query, value)| (query, value))
    }

    /// Number of fields
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Navigation property used to bind a lookup attribute
///
/// Prefixed custom lookups bind through their schema name
/// (`acme_batch` binds as `acme_Batch`); platform lookups bind as listed.
#[must_use]
pub fn navigation_property(attribute: &str) -> String {
    if attribute.contains('_') {
        schema_name(attribute)
    } else {
        attribute.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn fields_keep_insertion_order() {
        let record = WriteRecord::new()
            .with(FieldQuery::exact("acme_name"), "Q3")
            .with_lookup(FieldQuery::exact("acme_batch"), "batches", "b-1")
            .with(FieldQuery::exact("acme_version"), 2);

        let labels: Vec<_> = record.fields().map(|(q, _)| q.label()).collect();
        assert_eq!(labels, vec!["acme_name", "acme_batch", "acme_version"]);
        assert_eq!(record.len(), 3);
        assert_eq!(
            record.fields().nth(1).map(|(_, v)| v.clone()),
            Some(RecordValue::lookup("batches", "b-1"))
        );
        assert_eq!(
            record.fields().last().map(|(_, v)| v.clone()),
            Some(RecordValue::Value(json!(2)))
        );
    }

    #[test]
    fn navigation_property_names() {
        assert_eq!(navigation_property("acme_batch"), "acme_Batch");
        assert_eq!(navigation_property("parentcustomerid"), "parentcustomerid");
    }
}
