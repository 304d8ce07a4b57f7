//! Field picker
//!
//! Maps a semantic field role onto an attribute that actually exists on an
//! entity in this deployment. Candidate order is a preference ranking.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Attribute names of one entity, in the order the store listed them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownAttributes {
    names: IndexSet<String>,
}

impl KnownAttributes {
    /// Create empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `name` is known, compared exactly
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Names in listing order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Number of names
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no name is known
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for KnownAttributes {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Pick the attribute to use for a field role
///
/// In order:
/// 1. `preferred`, when non-empty and known
/// 2. the first of `candidates` that is known
/// 3. the first known name containing any of `substrings`, ignoring case,
///    scanning `known` in its listing order
/// 4. `None`: the field is unavailable and must be left out of the write
pub fn pick<S: AsRef<str>>(
    known: &KnownAttributes,
    preferred: Option<&str>,
    candidates: &[S],
    substrings: &[S],
) -> Option<String> {
    if let Some(preferred) = preferred.filter(|p| !p.is_empty()) {
        if known.contains(preferred) {
            return Some(preferred.to_string());
        }
    }

    if let Some(hit) = candidates
        .iter()
        .map(AsRef::as_ref)
        .find(|c| !c.is_empty() && known.contains(c))
    {
        return Some(hit.to_string());
    }

    let needles: Vec<String> = substrings
        .iter()
        .map(|s| s.as_ref().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    if needles.is_empty() {
        return None;
    }
    known
        .iter()
        .find(|name| {
            let lower = name.to_lowercase();
            needles.iter().any(|needle| lower.contains(needle.as_str()))
        })
        .map(str::to_string)
}

/// What to look for when resolving one field role
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldQuery {
    /// Exact name to use when present
    pub preferred: Option<String>,
    /// Known names in preference order
    pub candidates: Vec<String>,
    /// Case-insensitive fragments for the last-resort scan
    pub substrings: Vec<String>,
}

impl FieldQuery {
    /// Create empty query
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Query for exactly this attribute
    #[must_use]
    pub fn exact(name: impl Into<String>) -> Self {
        Self::new().with_preferred(name)
    }

    /// With preferred name
    #[inline]
    #[must_use]
    pub fn with_preferred(mut self, name: impl Into<String>) -> Self {
        self.preferred = Some(name.into());
        self
    }

    /// With one more candidate, ranked after earlier ones
    #[inline]
    #[must_use]
    pub fn with_candidate(mut self, name: impl Into<String>) -> Self {
        self.candidates.push(name.into());
        self
    }

    /// With candidates, ranked after earlier ones
    #[must_use]
    pub fn with_candidates<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.candidates.extend(names.into_iter().map(Into::into));
        self
    }

    /// With substring fragments
    #[must_use]
    pub fn with_substrings<I, S>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.substrings.extend(fragments.into_iter().map(Into::into));
        self
    }

    /// Run [`pick`] against `known`
    #[must_use]
    pub fn pick(&self, known: &KnownAttributes) -> Option<String> {
        pick(known, self.preferred.as_deref(), &self.candidates, &self.substrings)
    }

    /// Short label for logs
    #[must_use]
    pub fn label(&self) -> &str {
        self.preferred
            .as_deref()
            .or_else(|| self.candidates.first().map(String::as_str))
            .or_else(|| self.substrings.first().map(String::as_str))
            .unwrap_or("<empty>")
    }
}
