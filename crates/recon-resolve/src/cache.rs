//! Session schema cache using moka
//!
//! Holds what one session has discovered about the deployment: resolved
//! collections by role and attribute listings by entity. Concurrent
//! lookups of the same missing key share a single initialisation, so the
//! store sees one lookup per key.

use crate::error::ResolveError;
use crate::picker::KnownAttributes;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;

/// Default number of entries per map
pub const DEFAULT_CAPACITY: u64 = 1_024;

/// Where a resolved collection came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionSource {
    /// Found by metadata query
    Discovered,
    /// Configured default
    Fallback,
}

/// A role resolved to this deployment's collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedCollection {
    /// Application role
    pub role: String,
    /// Collection identifier for record writes
    pub collection_id: String,
    /// Entity logical name, when known
    pub logical_name: Option<String>,
    /// How it was found
    pub source: CollectionSource,
}

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Resolved roles held
    pub collections: u64,
    /// Attribute listings held
    pub attribute_sets: u64,
}

/// Discovered schema for one session
#[derive(Debug, Clone)]
pub struct SchemaCache {
    collections: Cache<String, ResolvedCollection>,
    attributes: Cache<String, Arc<KnownAttributes>>,
}

impl SchemaCache {
    /// Create cache holding up to `max_capacity` entries per map
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            collections: Cache::new(max_capacity),
            attributes: Cache::new(max_capacity),
        }
    }

    /// Resolved collection for role, discovering it at most once
    ///
    /// A failed discovery is not cached; the next call looks up again.
    ///
    /// # Errors
    /// Returns the discovery error, shared with every coalesced caller.
    pub async fn collection_or_try_insert_with<F>(
        &self,
        role: &str,
        discover: F,
    ) -> Result<ResolvedCollection, ResolveError>
    where
        F: Future<Output = Result<ResolvedCollection, ResolveError>>,
    {
        self.collections
            .try_get_with(role.to_string(), discover)
            .await
            .map_err(|shared| (*shared).clone())
    }

    /// Cached collection for role, without a lookup
    pub async fn collection(&self, role: &str) -> Option<ResolvedCollection> {
        self.collections.get(role).await
    }

    /// Attribute listing for entity, listing it at most once
    ///
    /// A failed listing is not cached; the next call lists again.
    ///
    /// # Errors
    /// Returns the listing error, shared with every coalesced caller.
    pub async fn attributes_or_try_insert_with<F>(
        &self,
        entity: &str,
        list: F,
    ) -> Result<Arc<KnownAttributes>, ResolveError>
    where
        F: Future<Output = Result<Arc<KnownAttributes>, ResolveError>>,
    {
        self.attributes
            .try_get_with(entity.to_string(), list)
            .await
            .map_err(|shared| (*shared).clone())
    }

    /// Cached attribute listing for entity, without probing
    pub async fn attributes(&self, entity: &str) -> Option<Arc<KnownAttributes>> {
        self.attributes.get(entity).await
    }

    /// Drop the attribute listing of one entity
    pub async fn invalidate_attributes(&self, entity: &str) {
        self.attributes.invalidate(entity).await;
    }

    /// Forget everything discovered
    #[inline]
    pub fn invalidate_all(&self) {
        self.collections.invalidate_all();
        self.attributes.invalidate_all();
    }

    /// Get cache statistics
    #[inline]
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            collections: self.collections.entry_count(),
            attribute_sets: self.attributes.entry_count(),
        }
    }
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
