//! Engine facade
//!
//! One [`Engine`] is one session: it owns the schema cache, so everything
//! discovered lives exactly as long as the engine does.

use crate::app;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::record::{navigation_property, RecordValue, WriteRecord};
use recon_catalog::{AttributeSpec, Catalog, EntitySpec};
use recon_client::{CancelSignal, HttpStoreClient, StoreClient, TokenProvider};
use recon_provision::{AttributeOutcome, EnsuredEntity, Provisioner, ProvisioningLog};
use recon_resolve::{
    AttributeResolver, CollectionResolver, FieldQuery, KnownAttributes, ResolvedCollection,
    RoleBindings, SchemaCache,
};
use recon_write::{AdaptiveWriter, FieldValue, WriteJob, WriteOutcome, WritePayload, WritePool};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Schema reconciliation and adaptive writes for one session
pub struct Engine<C> {
    client: Arc<C>,
    config: Arc<EngineConfig>,
    catalog: Option<Arc<Catalog>>,
    cache: SchemaCache,
    provisioner: Provisioner<C>,
    collections: CollectionResolver<C>,
    attributes: AttributeResolver<C>,
    writer: Arc<AdaptiveWriter<C>>,
    ensured_roles: Mutex<HashSet<String>>,
}

impl Engine<HttpStoreClient> {
    /// Connect to the configured store over HTTP
    ///
    /// # Errors
    /// - `EngineError::Config` if the configuration is unusable
    /// - `EngineError::Store` if the HTTP client cannot be built
    pub fn connect(config: EngineConfig, tokens: Arc<dyn TokenProvider>) -> EngineResult<Self> {
        config.validate()?;
        let client = HttpStoreClient::new(&config.store, tokens)?;
        Ok(Self::new(Arc::new(client), config))
    }
}

impl<C: StoreClient> Engine<C> {
    /// Create engine over a client
    #[must_use]
    pub fn new(client: Arc<C>, config: EngineConfig) -> Self {
        let bindings = Arc::new(config.effective_bindings());
        let cache = SchemaCache::new(config.cache_capacity);
        let provisioner = Provisioner::new(Arc::clone(&client)).with_labels(config.labels());
        let collections = CollectionResolver::new(Arc::clone(&client), bindings, cache.clone());
        let attributes = AttributeResolver::new(Arc::clone(&client), cache.clone());
        let writer = Arc::new(
            AdaptiveWriter::new(Arc::clone(&client)).with_max_attempts(config.max_write_attempts),
        );

        tracing::debug!(
            prefix = %config.publisher_prefix,
            roles = collections.bindings().len(),
            max_attempts = writer.max_attempts(),
            "engine session started"
        );

        Self {
            client,
            config: Arc::new(config),
            catalog: None,
            cache,
            provisioner,
            collections,
            attributes,
            writer,
            ensured_roles: Mutex::new(HashSet::new()),
        }
    }

    /// With the catalog used by [`provision_catalog`](Self::provision_catalog)
    /// and ensure-before-write
    #[inline]
    #[must_use]
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(Arc::new(catalog));
        self
    }

    /// Fresh session over the same client, configuration and catalog
    #[must_use]
    pub fn new_session(&self) -> Self {
        let mut session = Self::new(Arc::clone(&self.client), (*self.config).clone());
        session.catalog = self.catalog.clone();
        session
    }

    /// Session configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Role bindings in effect
    #[inline]
    #[must_use]
    pub fn bindings(&self) -> &RoleBindings {
        self.collections.bindings()
    }

    /// Session schema cache
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &SchemaCache {
        &self.cache
    }

    /// Configured catalog, or the application catalog for the prefix
    #[must_use]
    pub fn catalog(&self) -> Catalog {
        match &self.catalog {
            Some(catalog) => (**catalog).clone(),
            None => app::app_catalog(&self.config.publisher_prefix),
        }
    }

    /// Attribute query for a field role under the configured prefix
    #[inline]
    #[must_use]
    pub fn field(&self, role: app::FieldRole) -> FieldQuery {
        role.query(&self.config.publisher_prefix)
    }

    /// Make the entity exist
    ///
    /// # Errors
    /// `EngineError::Ensure` when it neither exists nor can be created
    pub async fn ensure_entity(&self, entity: &EntitySpec) -> EngineResult<EnsuredEntity> {
        let ensured = self.provisioner.ensurer().ensure_entity(entity).await?;
        if ensured.created {
            self.cache.invalidate_all();
        }
        Ok(ensured)
    }

    /// Make the attribute exist on `entity`
    ///
    /// # Errors
    /// `EngineError::Ensure` when it neither exists nor can be created
    pub async fn ensure_attribute(
        &self,
        entity: &str,
        attribute: &AttributeSpec,
    ) -> EngineResult<AttributeOutcome> {
        let outcome = self.provisioner.ensurer().ensure_attribute(entity, attribute).await?;
        if outcome == AttributeOutcome::Created {
            self.cache.invalidate_attributes(entity).await;
        }
        Ok(outcome)
    }

    /// Ensure every entity and attribute of `catalog`
    pub async fn provision(&self, catalog: &Catalog) -> ProvisioningLog {
        self.provision_with_cancel(catalog, &CancelSignal::never()).await
    }

    /// Ensure `catalog`, stopping between steps once `cancel` fires
    pub async fn provision_with_cancel(
        &self,
        catalog: &Catalog,
        cancel: &CancelSignal,
    ) -> ProvisioningLog {
        let log = self.provisioner.provision_with_cancel(catalog, cancel).await;
        self.cache.invalidate_all();
        tracing::info!(
            steps = log.len(),
            failed = log.failures().count(),
            "provisioning finished"
        );
        log
    }

    /// Ensure the configured catalog
    pub async fn provision_catalog(&self, cancel: &CancelSignal) -> ProvisioningLog {
        let catalog = self.catalog();
        self.provision_with_cancel(&catalog, cancel).await
    }

    /// Collection for an application role
    ///
    /// # Errors
    /// `EngineError::Resolve` if the role has no binding or its entity
    /// lookup fails
    pub async fn resolve_collection(&self, role: &str) -> EngineResult<ResolvedCollection> {
        Ok(self.collections.resolve(role).await?)
    }

    /// Attribute names of `entity`
    ///
    /// # Errors
    /// `EngineError::Resolve` if the store cannot list them
    pub async fn known_attributes(&self, entity: &str) -> EngineResult<Arc<KnownAttributes>> {
        Ok(self.attributes.known_attributes(entity).await?)
    }

    /// Attribute of `entity` matching `query`, or `None` when unavailable
    ///
    /// # Errors
    /// `EngineError::Resolve` if the store cannot list attributes
    pub async fn resolve_field(
        &self,
        entity: &str,
        query: &FieldQuery,
    ) -> EngineResult<Option<String>> {
        Ok(self.attributes.resolve_field(entity, query).await?)
    }

    /// Create a record, dropping fields the store rejects
    pub async fn adaptive_create(&self, collection: &str, payload: WritePayload) -> WriteOutcome {
        self.writer.create(collection, payload).await
    }

    /// Cancellable [`adaptive_create`](Self::adaptive_create)
    pub async fn adaptive_create_with_cancel(
        &self,
        collection: &str,
        payload: WritePayload,
        cancel: &CancelSignal,
    ) -> WriteOutcome {
        self.writer.create_with_cancel(collection, payload, cancel).await
    }

    /// Update a record, dropping fields the store rejects
    pub async fn adaptive_update(
        &self,
        collection: &str,
        id: &str,
        payload: WritePayload,
    ) -> WriteOutcome {
        self.writer.update(collection, id, payload).await
    }

    /// Cancellable [`adaptive_update`](Self::adaptive_update)
    pub async fn adaptive_update_with_cancel(
        &self,
        collection: &str,
        id: &str,
        payload: WritePayload,
        cancel: &CancelSignal,
    ) -> WriteOutcome {
        self.writer.update_with_cancel(collection, id, payload, cancel).await
    }

    /// Resolve a record of `role` into a write job
    ///
    /// Fields with no matching attribute are left out.
    ///
    /// # Errors
    /// - `EngineError::Resolve` for an unknown role or a failed lookup or listing
    /// - `EngineError::NoEntityForRole` if the role's entity is unknown
    /// - `EngineError::Ensure` if ensure-before-write fails
    pub async fn prepare(&self, role: &str, record: &WriteRecord) -> EngineResult<WriteJob> {
        let collection = self.resolve_collection(role).await?;
        let entity = collection
            .logical_name
            .clone()
            .ok_or_else(|| EngineError::NoEntityForRole(role.to_string()))?;
        self.ensure_before_write(role, &entity).await?;

        let mut payload = WritePayload::new();
        for (query, value) in record.fields() {
            let Some(attribute) = self.resolve_field(&entity, query).await? else {
                tracing::debug!(
                    role = %role,
                    entity = %entity,
                    field = query.label(),
                    "field omitted from record"
                );
                continue;
            };
            match value {
                RecordValue::Value(value) => {
                    payload.insert(attribute, FieldValue::Value(value.clone()));
                }
                RecordValue::Lookup { target_role, id } => {
                    let target = self.resolve_collection(target_role).await?;
                    payload.insert(
                        navigation_property(&attribute),
                        FieldValue::lookup(target.collection_id, id.clone()),
                    );
                }
            }
        }

        Ok(WriteJob::new(collection.collection_id, payload))
    }

    /// Create one record of `role`
    ///
    /// # Errors
    /// Resolution errors from [`prepare`](Self::prepare); write failures
    /// come back inside the outcome.
    pub async fn create_record(
        &self,
        role: &str,
        record: &WriteRecord,
    ) -> EngineResult<WriteOutcome> {
        let job = self.prepare(role, record).await?;
        Ok(self.writer.create(&job.collection, job.payload).await)
    }

    /// Create records of `role` with bounded parallelism
    ///
    /// Outcomes come back in input order.
    ///
    /// # Errors
    /// Resolution errors from [`prepare`](Self::prepare); nothing is written
    /// when resolution fails.
    pub async fn create_records(
        &self,
        role: &str,
        records: &[WriteRecord],
        cancel: &CancelSignal,
    ) -> EngineResult<Vec<WriteOutcome>> {
        let mut jobs = Vec::with_capacity(records.len());
        for record in records {
            jobs.push(self.prepare(role, record).await?);
        }
        let pool = WritePool::new(Arc::clone(&self.writer))
            .with_concurrency(self.config.write_concurrency);
        Ok(pool.create_all(jobs, cancel).await)
    }

    async fn ensure_before_write(&self, role: &str, entity: &str) -> EngineResult<()> {
        if !self.config.ensure_before_write {
            return Ok(());
        }
        let Some(spec) = self.catalog.as_ref().and_then(|c| c.get(entity)) else {
            return Ok(());
        };

        let mut ensured = self.ensured_roles.lock().await;
        if ensured.contains(role) {
            return Ok(());
        }

        let outcome = self.ensure_entity(spec).await?;
        for attribute in &spec.attributes {
            if let Err(err) = self.ensure_attribute(&outcome.logical_name, attribute).await {
                tracing::warn!(
                    entity = %entity,
                    attribute = %attribute.logical_name,
                    error = %err,
                    "attribute not ensured before write"
                );
            }
        }
        tracing::info!(
            role = %role,
            entity = %entity,
            created = outcome.created,
            "entity ensured before first write"
        );
        ensured.insert(role.to_string());
        Ok(())
    }
}

impl<C> std::fmt::Debug for Engine<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("catalog", &self.catalog.as_ref().map(|c| c.len()))
            .field("cache", &self.cache.stats())
            .finish_non_exhaustive()
    }
}
