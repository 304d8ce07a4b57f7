//! Catalog-wide provisioning pass

use crate::ensurer::{AttributeOutcome, EnsuredEntity, EntityEnsurer};
use crate::log::{attribute_step, entity_step, ProvisionStep, ProvisioningLog};
use recon_catalog::{Catalog, Labels};
use recon_client::{CancelSignal, StoreClient};
use std::collections::HashMap;
use std::sync::Arc;

/// Ensures every entity and attribute of a catalog
///
/// Entities are processed in dependency order, so lookup targets exist
/// before the lookups pointing at them. A failed step is logged and the
/// pass moves on.
#[derive(Debug, Clone)]
pub struct Provisioner<C> {
    ensurer: EntityEnsurer<C>,
}

impl<C: StoreClient> Provisioner<C> {
    /// Create provisioner over client
    #[inline]
    #[must_use]
    pub fn new(client: Arc<C>) -> Self {
        Self {
            ensurer: EntityEnsurer::new(client),
        }
    }

    /// With label settings for created metadata
    #[inline]
    #[must_use]
    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.ensurer = self.ensurer.with_labels(labels);
        self
    }

    /// Underlying ensurer
    #[inline]
    #[must_use]
    pub fn ensurer(&self) -> &EntityEnsurer<C> {
        &self.ensurer
    }

    /// Provision the whole catalog
    pub async fn provision(&self, catalog: &Catalog) -> ProvisioningLog {
        self.provision_with_cancel(catalog, &CancelSignal::never()).await
    }

    /// Provision the catalog, stopping between steps once `cancel` fires
    pub async fn provision_with_cancel(
        &self,
        catalog: &Catalog,
        cancel: &CancelSignal,
    ) -> ProvisioningLog {
        let mut log = ProvisioningLog::new();

        let order = match catalog.validate().and_then(|()| catalog.dependency_order()) {
            Ok(order) => order,
            Err(err) => {
                log.push(ProvisionStep::failed("catalog", err.to_string()));
                return log;
            }
        };

        tracing::info!(entities = order.len(), "provisioning catalog");
        let mut available: HashMap<&str, bool> = HashMap::new();

        'entities: for entity in order {
            if cancel.is_cancelled() {
                log.push(ProvisionStep::failed("cancelled", "provisioning cancelled by caller"));
                break;
            }

            let step = entity_step(&entity.logical_name);
            let ensured = match self.ensurer.ensure_entity(entity).await {
                Ok(ensured) => {
                    log.push(ProvisionStep::ok(step, entity_detail(&ensured)));
                    true
                }
                Err(err) => {
                    log.push(ProvisionStep::failed(step, err.to_string()));
                    false
                }
            };
            available.insert(&entity.logical_name, ensured);

            for attribute in &entity.attributes {
                let step = attribute_step(&entity.logical_name, &attribute.logical_name);
                if !ensured {
                    log.push(ProvisionStep::skipped(
                        step,
                        format!("entity {} unavailable", entity.logical_name),
                    ));
                    continue;
                }
                if let Some(target) = attribute.kind.lookup_target() {
                    if available.get(target) == Some(&false) {
                        log.push(ProvisionStep::skipped(
                            step,
                            format!("lookup target {target} unavailable"),
                        ));
                        continue;
                    }
                }
                if cancel.is_cancelled() {
                    log.push(ProvisionStep::failed(
                        "cancelled",
                        "provisioning cancelled by caller",
                    ));
                    break 'entities;
                }

                match self.ensurer.ensure_attribute(&entity.logical_name, attribute).await {
                    Ok(AttributeOutcome::Existing) => log.push(ProvisionStep::ok(step, "exists")),
                    Ok(AttributeOutcome::Created) => {
                        let detail = format!("created {}", attribute.kind.name());
                        log.push(ProvisionStep::ok(step, detail));
                    }
                    Err(err) => log.push(ProvisionStep::failed(step, err.to_string())),
                }
            }
        }

        log
    }
}

fn entity_detail(ensured: &EnsuredEntity) -> String {
    match (ensured.created, ensured.strategy) {
        (true, Some(strategy)) => format!("created via {strategy} ({})", ensured.collection_id),
        (true, None) => format!("created ({})", ensured.collection_id),
        (false, _) => format!("exists ({})", ensured.collection_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use recon_catalog::{AttributeKind, AttributeSpec, EntitySpec};
    use recon_client::CancelHandle;
    use recon_test_utils::{widget_catalog, SimulatedStore};

    #[tokio::test]
    async fn invalid_catalog_is_a_single_failed_step() {
        let catalog = Catalog::new()
            .with_entity(EntitySpec::new("widget", "Widget", "Widgets", "widgetname"))
            .with_entity(EntitySpec::new("widget", "Widget", "Widgets", "widgetname"));
        let provisioner = Provisioner::new(Arc::new(SimulatedStore::new()));

        let log = provisioner.provision(&catalog).await;
        assert_eq!(log.len(), 1);
        assert_eq!(log.steps()[0].step, "catalog");
        assert!(!log.is_success());
    }

    #[tokio::test]
    async fn cancelled_before_start_records_cancellation() {
        let store = SimulatedStore::new();
        let provisioner = Provisioner::new(Arc::new(store.clone()));
        let (handle, signal) = CancelHandle::pair();
        handle.cancel();

        let log = provisioner.provision_with_cancel(&widget_catalog(), &signal).await;
        assert_eq!(log.len(), 1);
        assert_eq!(log.steps()[0].step, "cancelled");
        assert!(store.entity_names().is_empty());
    }

    #[tokio::test]
    async fn lookup_to_external_entity_is_attempted() {
        let store = SimulatedStore::new();
        store.seed_entity("systemuser", "systemusers", &[]);
        let catalog = Catalog::new().with_entity(
            EntitySpec::new("widget", "Widget", "Widgets", "widgetname").with_attribute(
                AttributeSpec::new("owner", "Owner", AttributeKind::lookup("systemuser")),
            ),
        );
        let provisioner = Provisioner::new(Arc::new(store));

        let log = provisioner.provision(&catalog).await;
        assert!(log.is_success(), "{log}");
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn entity_detail_names_strategy() {
        let ensured = EnsuredEntity {
            logical_name: "widget".into(),
            collection_id: "widgets".into(),
            created: true,
            strategy: Some("create-entity action"),
        };
        assert_eq!(entity_detail(&ensured), "created via create-entity action (widgets)");
    }
}
