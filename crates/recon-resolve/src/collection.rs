//! EntitySet resolver
//!
//! Translates an application role into this deployment's collection
//! identifier by looking up entities whose logical name ends with the
//! role's suffixes.

use crate::binding::{RoleBinding, RoleBindings};
use crate::cache::{CollectionSource, ResolvedCollection, SchemaCache};
use crate::error::{ResolveError, ResolveResult};
use recon_client::{paths, StoreClient};
use serde_json::Value;
use std::sync::Arc;

/// One entity returned by a suffix lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMatch {
    /// Logical name
    pub logical_name: String,
    /// Collection identifier
    pub collection_id: String,
}

/// Whether `logical_name` matches `suffix` exactly
///
/// Exact means the whole name, or the part after the publisher prefix,
/// equals the suffix.
#[must_use]
pub fn is_exact_match(logical_name: &str, suffix: &str) -> bool {
    let name = logical_name.to_lowercase();
    let suffix = suffix.to_lowercase();
    name == suffix || name.split_once('_').is_some_and(|(_, rest)| rest == suffix)
}

/// Choose among lookup matches: exact suffix match first, else first returned
#[must_use]
pub fn select_match<'a>(matches: &'a [EntityMatch], suffix: &str) -> Option<&'a EntityMatch> {
    matches
        .iter()
        .find(|m| is_exact_match(&m.logical_name, suffix))
        .or_else(|| matches.first())
}

fn parse_matches(entries: &[Value], suffix: &str) -> Vec<EntityMatch> {
    let suffix = suffix.to_lowercase();
    entries
        .iter()
        .filter_map(|entry| {
            let logical_name = entry.get("LogicalName")?.as_str()?;
            let collection_id = entry.get("EntitySetName")?.as_str()?;
            if collection_id.is_empty() || !logical_name.to_lowercase().ends_with(&suffix) {
                return None;
            }
            Some(EntityMatch {
                logical_name: logical_name.to_string(),
                collection_id: collection_id.to_string(),
            })
        })
        .collect()
}

/// Resolves roles to collections, once per session
#[derive(Debug, Clone)]
pub struct CollectionResolver<C> {
    client: Arc<C>,
    bindings: Arc<RoleBindings>,
    cache: SchemaCache,
}

impl<C: StoreClient> CollectionResolver<C> {
    /// Create resolver sharing `cache` with the rest of the session
    #[must_use]
    pub fn new(client: Arc<C>, bindings: Arc<RoleBindings>, cache: SchemaCache) -> Self {
        Self {
            client,
            bindings,
            cache,
        }
    }

    /// Configured bindings
    #[inline]
    #[must_use]
    pub fn bindings(&self) -> &RoleBindings {
        &self.bindings
    }

    /// Resolve role to a collection
    ///
    /// The first call for a role looks the entity up; later calls, including
    /// concurrent ones, reuse that result. When no suffix matches, the
    /// binding's default collection is used.
    ///
    /// # Errors
    /// Returns `ResolveError::UnknownRole` when the role has no binding, and
    /// `ResolveError::Lookup` when a lookup fails in transport or is
    /// rejected. Failures are not cached.
    pub async fn resolve(&self, role: &str) -> ResolveResult<ResolvedCollection> {
        let binding = self
            .bindings
            .get(role)
            .ok_or_else(|| ResolveError::UnknownRole(role.to_string()))?;

        self.cache
            .collection_or_try_insert_with(role, self.discover(binding))
            .await
    }

    async fn discover(&self, binding: &RoleBinding) -> ResolveResult<ResolvedCollection> {
        for suffix in binding.suffixes.iter().filter(|s| !s.is_empty()) {
            let response = match self.client.get(&paths::entities_ending_with(suffix)).await {
                Ok(response) if response.is_success() => response,
                Ok(response) => {
                    let detail = response.diagnostic();
                    tracing::warn!(
                        role = %binding.role,
                        suffix = %suffix,
                        status = response.status,
                        detail = %detail,
                        "entity lookup rejected"
                    );
                    return Err(ResolveError::Lookup {
                        role: binding.role.clone(),
                        suffix: suffix.clone(),
                        status: Some(response.status),
                        detail,
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        role = %binding.role,
                        suffix = %suffix,
                        error = %err,
                        "entity lookup failed"
                    );
                    return Err(ResolveError::lookup_transport(&binding.role, suffix, &err));
                }
            };

            let matches = parse_matches(response.value_array(), suffix);
            if let Some(chosen) = select_match(&matches, suffix) {
                tracing::debug!(
                    role = %binding.role,
                    suffix = %suffix,
                    entity = %chosen.logical_name,
                    collection = %chosen.collection_id,
                    candidates = matches.len(),
                    "role resolved"
                );
                return Ok(ResolvedCollection {
                    role: binding.role.clone(),
                    collection_id: chosen.collection_id.clone(),
                    logical_name: Some(chosen.logical_name.clone()),
                    source: CollectionSource::Discovered,
                });
            }
        }

        tracing::warn!(
            role = %binding.role,
            collection = %binding.default_collection,
            "no entity matches role, using configured collection"
        );
        Ok(fallback(binding))
    }
}

fn fallback(binding: &RoleBinding) -> ResolvedCollection {
    ResolvedCollection {
        role: binding.role.clone(),
        collection_id: binding.default_collection.clone(),
        logical_name: binding.default_entity.clone(),
        source: CollectionSource::Fallback,
    }
}
