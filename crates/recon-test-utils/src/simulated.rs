//! Stateful in-memory store
//!
//! Understands the metadata paths produced by `recon_client::paths`, keeps
//! created entities and attributes, and validates record writes against
//! the writable attribute set, answering `Invalid property '<name>'` the
//! way the real store does.

use crate::recording::{Call, CallLog, Method};
use async_trait::async_trait;
use dashmap::DashMap;
use indexmap::{IndexMap, IndexSet};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use recon_client::{StoreClient, StoreResponse, StoreResult};
use regex::Regex;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^EntityDefinitions\(LogicalName='([^']*)'\)/Attributes\(LogicalName='([^']*)'\)")
        .expect("valid pattern")
});
static ATTRIBUTES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^EntityDefinitions\(LogicalName='([^']*)'\)/Attributes(\?.*)?$")
        .expect("valid pattern")
});
static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^EntityDefinitions\(LogicalName='([^']*)'\)(\?.*)?$").expect("valid pattern")
});
static ENDS_WITH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^EntityDefinitions\?.*endswith\(LogicalName,'([^']*)'\)").expect("valid pattern")
});
static RECORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z0-9_]+)\(([^)]*)\)$").expect("valid pattern"));
static COLLECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z0-9_]+)$").expect("valid pattern"));

/// One entity held by the simulated store
#[derive(Debug, Clone)]
pub struct SimEntity {
    pub logical_name: String,
    pub collection: String,
    /// Attribute logical name -> metadata type
    pub attributes: IndexMap<String, String>,
    /// Visible in metadata but rejected on write
    pub unwritable: HashSet<String>,
    pub records: IndexMap<String, Map<String, Value>>,
}

/// Stateful in-memory store
#[derive(Clone)]
pub struct SimulatedStore {
    entities: Arc<Mutex<IndexMap<String, SimEntity>>>,
    accepted_create_paths: Arc<Mutex<IndexSet<String>>>,
    denied: Arc<DashMap<Method, u16>>,
    log: Arc<CallLog>,
    next_id: Arc<AtomicU64>,
}

impl std::fmt::Debug for SimulatedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedStore")
            .field("entities", &self.entities.lock().keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Default for SimulatedStore {
    fn default() -> Self {
        Self::new()
    }
}

fn collection_for(logical_name: &str) -> String {
    if logical_name.ends_with('s') || logical_name.ends_with("ch") {
        format!("{logical_name}es")
    } else {
        format!("{logical_name}s")
    }
}

impl SimulatedStore {
    /// Store accepting every entity-creation path
    pub fn new() -> Self {
        let accepted = [
            "CreateEntity",
            "Microsoft.Dynamics.CRM.CreateEntity",
            "EntityDefinitions",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();

        Self {
            entities: Arc::new(Mutex::new(IndexMap::new())),
            accepted_create_paths: Arc::new(Mutex::new(accepted)),
            denied: Arc::new(DashMap::new()),
            log: Arc::new(CallLog::default()),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Only accept entity creation on the given paths; others answer 404
    #[must_use]
    pub fn accepting_entity_creation_on(self, paths: &[&str]) -> Self {
        {
            let mut accepted = self.accepted_create_paths.lock();
            accepted.clear();
            accepted.extend(paths.iter().map(|p| (*p).to_string()));
        }
        self
    }

    /// Answer every call of `method` with `status`
    pub fn deny(&self, method: Method, status: u16) {
        self.denied.insert(method, status);
    }

    /// Seed an existing entity with attributes
    pub fn seed_entity(&self, logical_name: &str, collection: &str, attributes: &[&str]) {
        let mut attrs = IndexMap::new();
        attrs.insert(format!("{logical_name}id"), "UniqueidentifierAttributeMetadata".to_string());
        for attribute in attributes {
            attrs.insert((*attribute).to_string(), "StringAttributeMetadata".to_string());
        }
        self.entities.lock().insert(
            logical_name.to_string(),
            SimEntity {
                logical_name: logical_name.to_string(),
                collection: collection.to_string(),
                attributes: attrs,
                unwritable: HashSet::new(),
                records: IndexMap::new(),
            },
        );
    }

    /// Make an attribute visible in metadata but rejected on write
    pub fn make_unwritable(&self, entity: &str, attribute: &str) {
        if let Some(e) = self.entities.lock().get_mut(entity) {
            e.attributes
                .entry(attribute.to_string())
                .or_insert_with(|| "StringAttributeMetadata".to_string());
            e.unwritable.insert(attribute.to_string());
        }
    }

    pub fn entity(&self, logical_name: &str) -> Option<SimEntity> {
        self.entities.lock().get(logical_name).cloned()
    }

    pub fn entity_names(&self) -> Vec<String> {
        self.entities.lock().keys().cloned().collect()
    }

    pub fn log(&self) -> &CallLog {
        &self.log
    }

    pub fn count(&self, method: Method) -> usize {
        self.log.count(method)
    }

    fn new_id(&self) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        format!("00000000-0000-4000-8000-{n:012x}")
    }

    fn error(status: u16, message: &str) -> StoreResponse {
        StoreResponse::json(status, json!({"error": {"code": "0x80000000", "message": message}}))
    }

    fn get_path(&self, path: &str) -> StoreResponse {
        let entities = self.entities.lock();

        if let Some(caps) = ATTRIBUTE.captures(path) {
            return match entities.get(&caps[1]).and_then(|e| e.attributes.get(&caps[2])) {
                Some(kind) => StoreResponse::json(
                    200,
                    json!({"LogicalName": &caps[2], "AttributeType": kind}),
                ),
                None => Self::error(404, "Could not find attribute"),
            };
        }
        if let Some(caps) = ATTRIBUTES.captures(path) {
            return match entities.get(&caps[1]) {
                Some(e) => {
                    let value: Vec<Value> =
                        e.attributes.keys().map(|a| json!({"LogicalName": a})).collect();
                    StoreResponse::json(200, json!({ "value": value }))
                }
                None => Self::error(404, "Could not find entity"),
            };
        }
        if let Some(caps) = ENTITY.captures(path) {
            return match entities.get(&caps[1]) {
                Some(e) => StoreResponse::json(
                    200,
                    json!({"LogicalName": e.logical_name, "EntitySetName": e.collection}),
                ),
                None => Self::error(404, "Could not find entity"),
            };
        }
        if let Some(caps) = ENDS_WITH.captures(path) {
            let suffix = caps[1].to_lowercase();
            let value: Vec<Value> = entities
                .values()
                .filter(|e| e.logical_name.to_lowercase().ends_with(&suffix))
                .map(|e| json!({"LogicalName": e.logical_name, "EntitySetName": e.collection}))
                .collect();
            return StoreResponse::json(200, json!({ "value": value }));
        }
        if let Some(caps) = RECORD.captures(path) {
            let record = entities
                .values()
                .find(|e| e.collection == caps[1])
                .and_then(|e| e.records.get(&caps[2]));
            return match record {
                Some(fields) => StoreResponse::json(200, Value::Object(fields.clone())),
                None => Self::error(404, "Record not found"),
            };
        }
        Self::error(404, &format!("Resource not found for the segment '{path}'"))
    }

    fn create_entity(&self, path: &str, body: &Value) -> StoreResponse {
        if !self.accepted_create_paths.lock().contains(path) {
            return Self::error(404, &format!("Resource not found for the segment '{path}'"));
        }

        let entity = body.get("Entity").unwrap_or(body);
        let Some(schema) = entity.get("SchemaName").and_then(Value::as_str) else {
            return Self::error(400, "SchemaName is required");
        };
        let primary = body
            .pointer("/PrimaryAttribute/SchemaName")
            .or_else(|| body.pointer("/Attributes/0/SchemaName"))
            .or_else(|| body.get("PrimaryNameAttribute"))
            .and_then(Value::as_str)
            .map(str::to_lowercase);

        let logical_name = schema.to_lowercase();
        let mut entities = self.entities.lock();
        if entities.contains_key(&logical_name) {
            return Self::error(
                409,
                &format!("An entity with the name {logical_name} already exists"),
            );
        }

        let mut attributes = IndexMap::new();
        attributes.insert(
            format!("{logical_name}id"),
            "UniqueidentifierAttributeMetadata".to_string(),
        );
        if let Some(primary) = primary {
            attributes.insert(primary, "StringAttributeMetadata".to_string());
        }

        let collection = collection_for(&logical_name);
        let metadata_id = self.new_id();
        entities.insert(
            logical_name.clone(),
            SimEntity {
                logical_name,
                collection,
                attributes,
                unwritable: HashSet::new(),
                records: IndexMap::new(),
            },
        );
        StoreResponse::empty(204).with_header(
            "OData-EntityId",
            format!("https://sim.example/api/data/v9.2/EntityDefinitions({metadata_id})"),
        )
    }

    fn create_attribute(&self, entity: &str, body: &Value) -> StoreResponse {
        let mut entities = self.entities.lock();
        let Some(e) = entities.get_mut(entity) else {
            return Self::error(404, "Could not find entity");
        };
        let Some(schema) = body.get("SchemaName").and_then(Value::as_str) else {
            return Self::error(400, "SchemaName is required");
        };
        let logical = schema.to_lowercase();
        if e.attributes.contains_key(&logical) {
            return Self::error(409, &format!("Attribute {logical} already exists"));
        }
        let kind = body
            .get("@odata.type")
            .and_then(Value::as_str)
            .unwrap_or("AttributeMetadata")
            .rsplit('.')
            .next()
            .unwrap_or("AttributeMetadata")
            .to_string();
        e.attributes.insert(logical, kind);
        StoreResponse::empty(204)
    }

    fn validate_fields(e: &SimEntity, body: &Value) -> Result<Map<String, Value>, StoreResponse> {
        let Some(fields) = body.as_object() else {
            return Err(Self::error(400, "Request body must be an object"));
        };
        for key in fields.keys() {
            let base = key.split('@').next().unwrap_or(key);
            // lookups bind through the schema-cased navigation property
            let attribute = if key.ends_with("@odata.bind") {
                base.to_lowercase()
            } else {
                base.to_string()
            };
            if !e.attributes.contains_key(&attribute) || e.unwritable.contains(&attribute) {
                return Err(Self::error(
                    400,
                    &format!(
                        "Invalid property '{base}' was found in entity 'Microsoft.Dynamics.CRM.{}'.",
                        e.logical_name
                    ),
                ));
            }
        }
        Ok(fields.clone())
    }

    fn write_record(&self, collection: &str, id: Option<&str>, body: &Value) -> StoreResponse {
        let mut entities = self.entities.lock();
        let Some(e) = entities.values_mut().find(|e| e.collection == collection) else {
            return Self::error(404, &format!("Resource not found for the segment '{collection}'"));
        };
        let fields = match Self::validate_fields(e, body) {
            Ok(fields) => fields,
            Err(response) => return response,
        };

        match id {
            None => {
                let id = self.new_id();
                e.records.insert(id.clone(), fields);
                StoreResponse::empty(204).with_header(
                    "OData-EntityId",
                    format!("https://sim.example/api/data/v9.2/{collection}({id})"),
                )
            }
            Some(id) => match e.records.get_mut(id) {
                Some(existing) => {
                    existing.extend(fields);
                    StoreResponse::empty(204)
                }
                None => Self::error(404, "Record not found"),
            },
        }
    }

    fn post_path(&self, path: &str, body: &Value) -> StoreResponse {
        if let Some(caps) = ATTRIBUTES.captures(path) {
            return self.create_attribute(&caps[1], body);
        }
        if path == "EntityDefinitions"
            || path == "CreateEntity"
            || path == "Microsoft.Dynamics.CRM.CreateEntity"
        {
            return self.create_entity(path, body);
        }
        if let Some(caps) = COLLECTION.captures(path) {
            return self.write_record(&caps[1], None, body);
        }
        Self::error(404, &format!("Resource not found for the segment '{path}'"))
    }

    fn patch_path(&self, path: &str, body: &Value) -> StoreResponse {
        match RECORD.captures(path) {
            Some(caps) => self.write_record(&caps[1], Some(&caps[2]), body),
            None => Self::error(404, &format!("Resource not found for the segment '{path}'")),
        }
    }

    fn delete_path(&self, path: &str) -> StoreResponse {
        let Some(caps) = RECORD.captures(path) else {
            return Self::error(404, "Resource not found");
        };
        let mut entities = self.entities.lock();
        let removed = entities
            .values_mut()
            .find(|e| e.collection == caps[1])
            .and_then(|e| e.records.shift_remove(&caps[2]));
        match removed {
            Some(_) => StoreResponse::empty(204),
            None => Self::error(404, "Record not found"),
        }
    }

    async fn handle(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> StoreResult<StoreResponse> {
        self.log.record(Call {
            method,
            path: path.to_string(),
            body: body.cloned(),
        });
        self.log.enter(None).await;

        let denied = self.denied.get(&method).map(|s| *s);
        let null = Value::Null;
        let response = match denied {
            Some(status) => Self::error(status, "Principal user is missing privilege"),
            None => match method {
                Method::Get => self.get_path(path),
                Method::Post => self.post_path(path, body.unwrap_or(&null)),
                Method::Patch => self.patch_path(path, body.unwrap_or(&null)),
                Method::Delete => self.delete_path(path),
            },
        };

        self.log.leave();
        Ok(response)
    }
}

#[async_trait]
impl StoreClient for SimulatedStore {
    async fn get(&self, path: &str) -> StoreResult<StoreResponse> {
        self.handle(Method::Get, path, None).await
    }

    async fn post(&self, path: &str, body: &Value) -> StoreResult<StoreResponse> {
        self.handle(Method::Post, path, Some(body)).await
    }

    async fn patch(&self, path: &str, body: &Value) -> StoreResult<StoreResponse> {
        self.handle(Method::Patch, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> StoreResult<StoreResponse> {
        self.handle(Method::Delete, path, None).await
    }
}
