//! Adaptive write executor
//!
//! Writes one record when the exact set of writable attributes is not
//! known in advance. A 400 that names a field causes that field to be
//! dropped and the write retried; anything else stops immediately.

use crate::diagnostic::{DiagnosticParser, InvalidPropertyParser};
use crate::error::{FailureKind, WriteFailure};
use crate::payload::WritePayload;
use recon_client::{paths, CancelSignal, StatusClass, StoreClient, StoreResponse, StoreResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Default cap on network writes per record
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// A record the store accepted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteSuccess {
    /// Record identifier, when the store reported one
    pub id: Option<String>,
    /// Network writes issued
    pub attempts: u32,
    /// Body the store accepted
    pub accepted: Value,
    /// Fields dropped on the way, in removal order
    pub removed: Vec<String>,
}

/// Result of one adaptive write
pub type WriteOutcome = Result<WriteSuccess, WriteFailure>;

#[derive(Debug, Clone, Copy)]
enum Target<'a> {
    Create { collection: &'a str },
    Update { collection: &'a str, id: &'a str },
}

impl Target<'_> {
    fn collection(&self) -> &str {
        match self {
            Self::Create { collection } | Self::Update { collection, .. } => collection,
        }
    }
}

/// Bounded retry-with-removal writer
#[derive(Debug, Clone)]
pub struct AdaptiveWriter<C, P = InvalidPropertyParser> {
    client: Arc<C>,
    parser: P,
    max_attempts: u32,
}

impl<C: StoreClient> AdaptiveWriter<C> {
    /// Create writer with the default diagnostic parser
    #[inline]
    #[must_use]
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            parser: InvalidPropertyParser,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl<C: StoreClient, P: DiagnosticParser> AdaptiveWriter<C, P> {
    /// With another diagnostic parser
    #[must_use]
    pub fn with_parser<Q: DiagnosticParser>(self, parser: Q) -> AdaptiveWriter<C, Q> {
        AdaptiveWriter {
            client: self.client,
            parser,
            max_attempts: self.max_attempts,
        }
    }

    /// With attempt cap; at least one attempt is always made
    #[inline]
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Attempt cap
    #[inline]
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Create a record in `collection`
    pub async fn create(&self, collection: &str, payload: WritePayload) -> WriteOutcome {
        self.create_with_cancel(collection, payload, &CancelSignal::never())
            .await
    }

    /// Create a record, giving up once `cancel` fires
    pub async fn create_with_cancel(
        &self,
        collection: &str,
        payload: WritePayload,
        cancel: &CancelSignal,
    ) -> WriteOutcome {
        self.run(Target::Create { collection }, payload, cancel).await
    }

    /// Update record `id` in `collection`
    pub async fn update(&self, collection: &str, id: &str, payload: WritePayload) -> WriteOutcome {
        self.update_with_cancel(collection, id, payload, &CancelSignal::never())
            .await
    }

    /// Update a record, giving up once `cancel` fires
    pub async fn update_with_cancel(
        &self,
        collection: &str,
        id: &str,
        payload: WritePayload,
        cancel: &CancelSignal,
    ) -> WriteOutcome {
        self.run(Target::Update { collection, id }, payload, cancel)
            .await
    }

    async fn send(&self, target: Target<'_>, body: &Value) -> StoreResult<StoreResponse> {
        match target {
            Target::Create { collection } => self.client.post(collection, body).await,
            Target::Update { collection, id } => {
                self.client.patch(&paths::record(collection, id), body).await
            }
        }
    }

    async fn run(
        &self,
        target: Target<'_>,
        mut payload: WritePayload,
        cancel: &CancelSignal,
    ) -> WriteOutcome {
        let collection = target.collection();
        let mut attempts = 0;
        let mut removed: Vec<String> = Vec::new();

        loop {
            if cancel.is_cancelled() {
                return Err(WriteFailure::cancelled().after(attempts, removed));
            }

            let body = payload.to_json();
            attempts += 1;
            let sent = tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                result = self.send(target, &body) => Some(result),
            };

            let response = match sent {
                Some(Ok(response)) => response,
                Some(Err(err)) => {
                    tracing::warn!(
                        collection = %collection,
                        attempt = attempts,
                        error = %err,
                        "write failed in transport"
                    );
                    return Err(WriteFailure::transport(&err).after(attempts, removed));
                }
                None => {
                    tracing::info!(
                        collection = %collection,
                        attempt = attempts,
                        "write cancelled in flight"
                    );
                    return Err(WriteFailure::cancelled().after(attempts, removed));
                }
            };

            let class = response.class();
            if class == StatusClass::Success {
                let id = match target {
                    Target::Update { id, .. } => Some(id.to_string()),
                    Target::Create { .. } => response.entity_id(),
                };
                tracing::info!(
                    collection = %collection,
                    id = id.as_deref().unwrap_or(""),
                    attempts,
                    removed = removed.len(),
                    "record written"
                );
                return Ok(WriteSuccess {
                    id,
                    attempts,
                    accepted: body,
                    removed,
                });
            }

            let status = Some(response.status);
            let detail = response.diagnostic();
            if class != StatusClass::BadPayload {
                let kind = FailureKind::for_status(class);
                tracing::warn!(
                    collection = %collection,
                    status = response.status,
                    kind = %kind,
                    detail = %detail,
                    "write rejected"
                );
                return Err(WriteFailure::new(kind, status, detail).after(attempts, removed));
            }

            let Some(offending) = self.parser.parse_invalid_property(&detail) else {
                tracing::warn!(
                    collection = %collection,
                    detail = %detail,
                    "bad payload without an identifiable field"
                );
                return Err(
                    WriteFailure::new(FailureKind::BadPayloadUnidentifiable, status, detail)
                        .after(attempts, removed),
                );
            };

            let mut trimmed = payload.clone();
            let Some(field) = trimmed.remove_field(&offending) else {
                tracing::warn!(
                    collection = %collection,
                    field = %offending,
                    "store rejected a field that is no longer in the payload"
                );
                return Err(
                    WriteFailure::new(FailureKind::BadPayload, status, detail)
                        .after(attempts, removed),
                );
            };

            if attempts >= self.max_attempts {
                tracing::warn!(
                    collection = %collection,
                    attempts,
                    field = %field,
                    "attempt cap reached"
                );
                return Err(
                    WriteFailure::new(FailureKind::AttemptsExhausted, status, detail)
                        .after(attempts, removed),
                );
            }

            tracing::warn!(
                collection = %collection,
                field = %field,
                attempt = attempts,
                "store rejected field, retrying without it"
            );
            removed.push(field);
            payload = trimmed;
        }
    }
}
