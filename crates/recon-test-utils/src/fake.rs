//! Scripted fake store
//!
//! Rules match a method and a path (exact, or prefix when the pattern ends
//! with `*`). Each rule replays its replies in order and repeats the last
//! one. Unmatched calls answer 404.

use crate::recording::{Call, CallLog, Method};
use async_trait::async_trait;
use parking_lot::Mutex;
use recon_client::{StoreClient, StoreError, StoreResponse, StoreResult};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Scripted answer
#[derive(Debug, Clone)]
pub enum Reply {
    Response(StoreResponse),
    Timeout,
    Network(String),
}

impl Reply {
    pub fn status(status: u16) -> Self {
        Self::Response(StoreResponse::empty(status))
    }

    pub fn json(status: u16, body: Value) -> Self {
        Self::Response(StoreResponse::json(status, body))
    }

    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, json!({"error": {"code": "0x80000000", "message": message}}))
    }

    /// 400 naming one unknown property
    pub fn invalid_property(name: &str) -> Self {
        Self::error(
            400,
            &format!("Invalid property '{name}' was found in entity 'Microsoft.Dynamics.CRM.record'."),
        )
    }

    /// 204 with the created record's id in `OData-EntityId`
    pub fn created(collection: &str, id: &str) -> Self {
        Self::Response(StoreResponse::empty(204).with_header(
            "OData-EntityId",
            format!("https://fake.example/api/data/v9.2/{collection}({id})"),
        ))
    }

    /// Entity definition answer
    pub fn entity(logical_name: &str, collection: &str) -> Self {
        Self::json(
            200,
            json!({"LogicalName": logical_name, "EntitySetName": collection}),
        )
    }

    /// Entity listing answer of `(logical name, collection)` pairs
    pub fn entities(entities: &[(&str, &str)]) -> Self {
        let value: Vec<Value> = entities
            .iter()
            .map(|(n, c)| json!({"LogicalName": n, "EntitySetName": c}))
            .collect();
        Self::json(200, json!({ "value": value }))
    }

    /// Collection answer with one `LogicalName` per entry
    pub fn names(names: &[&str]) -> Self {
        let value: Vec<Value> = names.iter().map(|n| json!({"LogicalName": n})).collect();
        Self::json(200, json!({ "value": value }))
    }
}

type Handler = Box<dyn Fn(&Call, usize) -> Reply + Send + Sync>;

struct Rule {
    method: Method,
    pattern: String,
    handler: Handler,
    hits: usize,
}

impl Rule {
    fn matches(&self, method: Method, path: &str) -> bool {
        if self.method != method {
            return false;
        }
        match self.pattern.strip_suffix('*') {
            Some(prefix) => path.starts_with(prefix),
            None => self.pattern == path,
        }
    }
}

/// Store answering from scripted rules
#[derive(Clone, Default)]
pub struct FakeStore {
    rules: Arc<Mutex<Vec<Rule>>>,
    log: Arc<CallLog>,
    latency: Option<Duration>,
}

impl std::fmt::Debug for FakeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeStore")
            .field("rules", &self.rules.lock().len())
            .field("calls", &self.log.calls().len())
            .finish()
    }
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every call for `latency` before answering
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Replay `replies` in order for matching calls, repeating the last
    pub fn on(&self, method: Method, pattern: &str, replies: Vec<Reply>) -> &Self {
        let replies = if replies.is_empty() {
            vec![Reply::status(404)]
        } else {
            replies
        };
        self.on_fn(method, pattern, move |_, n| {
            replies[n.min(replies.len() - 1)].clone()
        })
    }

    /// Answer matching calls with a closure of (call, zero-based hit count)
    pub fn on_fn<F>(&self, method: Method, pattern: &str, handler: F) -> &Self
    where
        F: Fn(&Call, usize) -> Reply + Send + Sync + 'static,
    {
        self.rules.lock().push(Rule {
            method,
            pattern: pattern.to_string(),
            handler: Box::new(handler),
            hits: 0,
        });
        self
    }

    pub fn log(&self) -> &CallLog {
        &self.log
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.calls()
    }

    pub fn count(&self, method: Method) -> usize {
        self.log.count(method)
    }

    pub fn count_path(&self, method: Method, path: &str) -> usize {
        self.log.count_path(method, path)
    }

    pub fn bodies(&self, method: Method, path: &str) -> Vec<Value> {
        self.log.bodies(method, path)
    }

    async fn handle(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> StoreResult<StoreResponse> {
        let call = Call {
            method,
            path: path.to_string(),
            body: body.cloned(),
        };
        self.log.record(call.clone());
        self.log.enter(self.latency).await;

        let reply = {
            let mut rules = self.rules.lock();
            match rules.iter_mut().find(|r| r.matches(method, path)) {
                Some(rule) => {
                    let reply = (rule.handler)(&call, rule.hits);
                    rule.hits += 1;
                    reply
                }
                None => Reply::error(404, &format!("no rule for {method:?} {path}")),
            }
        };

        self.log.leave();
        match reply {
            Reply::Response(response) => Ok(response),
            Reply::Timeout => Err(StoreError::timeout(path, 30)),
            Reply::Network(message) => Err(StoreError::network(path, message)),
        }
    }
}

#[async_trait]
impl StoreClient for FakeStore {
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
