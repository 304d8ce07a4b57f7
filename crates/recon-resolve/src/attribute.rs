//! Attribute resolver

use crate::cache::SchemaCache;
use crate::error::{ResolveError, ResolveResult};
use crate::picker::{FieldQuery, KnownAttributes};
use recon_client::{paths, StoreClient};
use serde_json::Value;
use std::sync::Arc;

/// Resolves field roles against the attributes an entity actually has
#[derive(Debug, Clone)]
pub struct AttributeResolver<C> {
    client: Arc<C>,
    cache: SchemaCache,
}

impl<C: StoreClient> AttributeResolver<C> {
    /// Create resolver sharing `cache` with the rest of the session
    #[must_use]
    pub fn new(client: Arc<C>, cache: SchemaCache) -> Self {
        Self { client, cache }
    }

    /// Attribute names of entity, listed at most once per session
    ///
    /// # Errors
    /// Returns `ResolveError::Listing` when the store cannot list them.
    pub async fn known_attributes(&self, entity: &str) -> ResolveResult<Arc<KnownAttributes>> {
        self.cache
            .attributes_or_try_insert_with(entity, self.list(entity))
            .await
    }

    /// Attribute to use for a field role, or `None` when unavailable
    ///
    /// # Errors
    /// Returns `ResolveError::Listing` when the store cannot list attributes.
    pub async fn resolve_field(
        &self,
        entity: &str,
        query: &FieldQuery,
    ) -> ResolveResult<Option<String>> {
        let known = self.known_attributes(entity).await?;
        let picked = query.pick(&known);
        match &picked {
            Some(name) => tracing::trace!(
                entity = %entity,
                field = query.label(),
                attribute = %name,
                "field resolved"
            ),
            None => tracing::debug!(
                entity = %entity,
                field = query.label(),
                "field unavailable on entity"
            ),
        }
        Ok(picked)
    }

    async fn list(&self, entity: &str) -> ResolveResult<Arc<KnownAttributes>> {
        let response = self
            .client
            .get(&paths::attribute_names(entity))
            .await
            .map_err(|err| ResolveError::transport(entity, &err))?;

        if !response.is_success() {
            return Err(ResolveError::Listing {
                entity: entity.to_string(),
                status: Some(response.status),
                detail: response.diagnostic(),
            });
        }

        let known: KnownAttributes = response
            .value_array()
            .iter()
            .filter_map(|entry| entry.get("LogicalName").and_then(Value::as_str))
            .collect();
        tracing::debug!(entity = %entity, attributes = known.len(), "attributes listed");
        Ok(Arc::new(known))
    }
}
