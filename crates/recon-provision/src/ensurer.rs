//! Entity and attribute ensure-or-create
//!
//! Both operations probe first and only write when the probe reports the
//! target missing, so repeated calls converge on a single remote object.

use crate::error::{EnsureError, EnsureResult};
use crate::log::{attribute_step, entity_step};
use recon_catalog::{
    attribute_payload, entity_strategies, AttributeKind, AttributeSpec, EntitySpec, Labels,
};
use recon_client::{paths, StatusClass, StoreClient, StoreResponse};
use serde_json::Value;
use std::sync::Arc;

/// Result of ensuring an entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsuredEntity {
    /// Logical name
    pub logical_name: String,
    /// Collection identifier used for record writes
    pub collection_id: String,
    /// Whether this call created it
    pub created: bool,
    /// Strategy that created it
    pub strategy: Option<&'static str>,
}

/// Result of ensuring an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOutcome {
    /// Already present; left untouched
    Existing,
    /// Created by this call
    Created,
}

/// Metadata type name prefix the store reports for a kind
fn reported_type(kind: &AttributeKind) -> &'static str {
    match kind {
        AttributeKind::String { .. } | AttributeKind::Url { .. } => "String",
        AttributeKind::Integer { .. } => "Integer",
        AttributeKind::Boolean => "Boolean",
        AttributeKind::DateOnly | AttributeKind::DateTime { .. } => "DateTime",
        AttributeKind::Lookup { .. } => "Lookup",
    }
}

fn collection_or_conventional(entity: &EntitySpec, collection: String) -> String {
    if collection.is_empty() {
        entity.conventional_collection()
    } else {
        collection
    }
}

/// Makes entities and attributes exist without failing when they already do
#[derive(Debug, Clone)]
pub struct EntityEnsurer<C> {
    client: Arc<C>,
    labels: Labels,
}

impl<C: StoreClient> EntityEnsurer<C> {
    /// Create ensurer over client
    #[inline]
    #[must_use]
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            labels: Labels::default(),
        }
    }

    /// With label settings for created metadata
    #[inline]
    #[must_use]
    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    /// Look up an entity's collection identifier by logical name
    ///
    /// Returns `None` when the store reports the entity missing.
    ///
    /// # Errors
    /// - `EnsureError::PermissionDenied` on 401/403
    /// - `EnsureError::Probe` on any other non-2xx, non-404 answer
    /// - `EnsureError::Store` on transport failure
    pub async fn probe_entity(&self, logical_name: &str) -> EnsureResult<Option<String>> {
        let response = self.client.get(&paths::entity_definition(logical_name)).await?;
        match response.class() {
            StatusClass::Success => {
                let body = response.body_json();
                if body.and_then(|b| b.get("LogicalName")).is_none() {
                    return Ok(None);
                }
                let collection = body
                    .and_then(|b| b.get("EntitySetName"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
                Ok(Some(collection.unwrap_or_default()))
            }
            StatusClass::NotFound => Ok(None),
            StatusClass::PermissionDenied => Err(EnsureError::permission_denied(
                entity_step(logical_name),
                response.status,
                response.diagnostic(),
            )),
            _ => Err(EnsureError::Probe {
                target: logical_name.to_string(),
                status: response.status,
                detail: response.diagnostic(),
            }),
        }
    }

    /// Ensure the entity exists, creating it if missing
    ///
    /// Creation strategies are tried in order and the first 2xx wins. A
    /// 401/403 stops the iteration; a conflict means someone else created
    /// it concurrently and the entity is re-probed.
    ///
    /// # Errors
    /// - `EnsureError::PermissionDenied` on 401/403 from probe or creation
    /// - `EnsureError::CreationFailed` with the last diagnostic when every strategy fails
    /// - `EnsureError::Probe`/`EnsureError::Store` when the initial probe fails
    pub async fn ensure_entity(&self, entity: &EntitySpec) -> EnsureResult<EnsuredEntity> {
        let name = &entity.logical_name;

        if let Some(collection) = self.probe_entity(name).await? {
            tracing::debug!(entity = %name, collection = %collection, "entity already exists");
            return Ok(EnsuredEntity {
                logical_name: name.clone(),
                collection_id: collection_or_conventional(entity, collection),
                created: false,
                strategy: None,
            });
        }

        let mut last: (Option<u16>, String) = (None, "no creation strategy attempted".to_string());
        for strategy in entity_strategies(entity, &self.labels) {
            tracing::debug!(entity = %name, strategy = strategy.name, "creating entity");

            let response = match self.client.post(&strategy.path, &strategy.body).await {
                Ok(response) => response,
                Err(err) => {
                    tracing::warn!(
                        entity = %name,
                        strategy = strategy.name,
                        error = %err,
                        "entity creation call failed"
                    );
                    last = (None, err.to_string());
                    continue;
                }
            };

            match response.class() {
                StatusClass::Success => {
                    let collection = self.collection_after_create(entity).await;
                    tracing::info!(
                        entity = %name,
                        strategy = strategy.name,
                        collection = %collection,
                        "entity created"
                    );
                    return Ok(EnsuredEntity {
                        logical_name: name.clone(),
                        collection_id: collection,
                        created: true,
                        strategy: Some(strategy.name),
                    });
                }
                StatusClass::PermissionDenied => {
                    return Err(EnsureError::permission_denied(
                        entity_step(name),
                        response.status,
                        response.diagnostic(),
                    ));
                }
                StatusClass::Conflict => {
                    if let Ok(Some(collection)) = self.probe_entity(name).await {
                        return Ok(EnsuredEntity {
                            logical_name: name.clone(),
                            collection_id: collection_or_conventional(entity, collection),
                            created: false,
                            strategy: None,
                        });
                    }
                    last = (Some(response.status), response.diagnostic());
                }
                _ => {
                    tracing::debug!(
                        entity = %name,
                        strategy = strategy.name,
                        status = response.status,
                        "entity creation strategy rejected"
                    );
                    last = (Some(response.status), response.diagnostic());
                }
            }
        }

        Err(EnsureError::CreationFailed {
            entity: name.clone(),
            status: last.0,
            detail: last.1,
        })
    }

    async fn collection_after_create(&self, entity: &EntitySpec) -> String {
        match self.probe_entity(&entity.logical_name).await {
            Ok(Some(collection)) if !collection.is_empty() => collection,
            _ => {
                let fallback = entity.conventional_collection();
                tracing::warn!(
                    entity = %entity.logical_name,
                    collection = %fallback,
                    "created entity not yet visible in metadata, using conventional collection name"
                );
                fallback
            }
        }
    }

    /// Ensure the attribute exists on the entity, creating it if missing
    ///
    /// An existing attribute is never altered, even when its kind differs.
    ///
    /// # Errors
    /// - `EnsureError::PermissionDenied` on 401/403
    /// - `EnsureError::AttributeFailed` when creation is rejected
    /// - `EnsureError::Probe`/`EnsureError::Store` when the probe fails
    pub async fn ensure_attribute(
        &self,
        entity_logical_name: &str,
        attribute: &AttributeSpec,
    ) -> EnsureResult<AttributeOutcome> {
        let step = attribute_step(entity_logical_name, &attribute.logical_name);
        let probe = self
            .client
            .get(&paths::attribute_definition(entity_logical_name, &attribute.logical_name))
            .await?;

        match probe.class() {
            StatusClass::Success => {
                Self::warn_on_kind_mismatch(entity_logical_name, attribute, &probe);
                return Ok(AttributeOutcome::Existing);
            }
            StatusClass::NotFound => {}
            StatusClass::PermissionDenied => {
                return Err(EnsureError::permission_denied(step, probe.status, probe.diagnostic()));
            }
            _ => {
                return Err(EnsureError::Probe {
                    target: format!("{entity_logical_name}.{}", attribute.logical_name),
                    status: probe.status,
                    detail: probe.diagnostic(),
                });
            }
        }

        let body = attribute_payload(attribute, &self.labels);
        let response = self
            .client
            .post(&paths::attribute_collection(entity_logical_name), &body)
            .await?;

        match response.class() {
            StatusClass::Success => {
                tracing::info!(
                    entity = %entity_logical_name,
                    attribute = %attribute.logical_name,
                    kind = attribute.kind.name(),
                    "attribute created"
                );
                Ok(AttributeOutcome::Created)
            }
            StatusClass::PermissionDenied => Err(EnsureError::permission_denied(
                step,
                response.status,
                response.diagnostic(),
            )),
            _ => Err(EnsureError::AttributeFailed {
                entity: entity_logical_name.to_string(),
                attribute: attribute.logical_name.clone(),
                status: response.status,
                detail: response.diagnostic(),
            }),
        }
    }

    fn warn_on_kind_mismatch(entity: &str, attribute: &AttributeSpec, probe: &StoreResponse) {
        let reported = probe
            .body_json()
            .and_then(|b| b.get("AttributeType"))
            .and_then(Value::as_str);
        let expected = reported_type(&attribute.kind);
        if let Some(reported) = reported {
            if !reported.starts_with(expected) {
                tracing::warn!(
                    entity = %entity,
                    attribute = %attribute.logical_name,
                    expected,
                    reported,
                    "existing attribute has a different kind; left unchanged"
                );
            }
        }
    }
}
