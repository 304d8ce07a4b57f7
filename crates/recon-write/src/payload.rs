//! Write payloads
//!
//! An ordered map of attribute name to value. Only resolved attribute names
//! go in, and any one of them can be taken out again when the store
//! rejects it.

use indexmap::IndexMap;
use recon_client::paths;
use serde_json::{Map, Value};

const BIND_SUFFIX: &str = "@odata.bind";

/// Value of one field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Plain JSON value
    Value(Value),
    /// Reference to a record in another collection
    Lookup {
        /// Target collection identifier
        collection: String,
        /// Target record identifier
        id: String,
    },
}

impl FieldValue {
    /// Create lookup value
    pub fn lookup(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::Lookup {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// JSON key this value is written under
    #[must_use]
    pub fn json_key(&self, name: &str) -> String {
        match self {
            Self::Value(_) => name.to_string(),
            Self::Lookup { .. } => format!("{name}{BIND_SUFFIX}"),
        }
    }

    /// JSON value as written
    #[must_use]
    pub fn json_value(&self) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Lookup { collection, id } => Value::String(paths::bind_reference(collection, id)),
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// Ordered record payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WritePayload {
    fields: IndexMap<String, FieldValue>,
}

impl WritePayload {
    /// Create empty payload
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With plain field
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, FieldValue::Value(value.into()));
        self
    }

    /// With lookup field bound to `collection(id)`
    #[must_use]
    pub fn with_lookup(
        mut self,
        name: impl Into<String>,
        collection: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        self.insert(name, FieldValue::lookup(collection, id));
        self
    }

    /// Insert field, replacing an earlier value of the same name in place
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    /// Remove the field a diagnostic named
    ///
    /// `offending` may be the plain attribute name or the `@odata.bind`
    /// key of a lookup. An exact match is preferred; otherwise the name is
    /// compared ignoring case. Returns the removed attribute name.
    pub fn remove_field(&mut self, offending: &str) -> Option<String> {
        let base = offending.strip_suffix(BIND_SUFFIX).unwrap_or(offending);
        let key = if self.fields.contains_key(base) {
            base.to_string()
        } else {
            self.fields.keys().find(|k| k.eq_ignore_ascii_case(base))?.clone()
        };
        self.fields.shift_remove(&key)?;
        Some(key)
    }

    /// Whether a field of this name is present
    #[inline]
    #[must_use]
    pub fn contains_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Field value by name
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Attribute names in insertion order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of fields
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the payload is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// JSON object sent to the store
    #[must_use]
    pub fn to_json(&self) -> Value {
        let object: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, value)| (value.json_key(name), value.json_value()))
            .collect();
        Value::Object(object)
    }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for WritePayload {
    fn from_iter<T: IntoIterator<Item = (K, FieldValue)>>(iter: T) -> Self {
        let mut payload = Self::new();
        for (name, value) in iter {
            payload.insert(name, value);
        }
        payload
    }
}
