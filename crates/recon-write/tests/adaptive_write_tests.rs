use pretty_assertions::assert_eq;
use recon_client::{CancelHandle, CancelSignal};
use recon_test_utils::{FakeStore, Method, Reply, SimulatedStore};
use recon_write::{AdaptiveWriter, FailureKind, WriteJob, WritePayload, WritePool};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn body_has(call: &recon_test_utils::Call, key: &str) -> bool {
    call.body
        .as_ref()
        .and_then(|b| b.as_object())
        .is_some_and(|o| o.contains_key(key))
}

fn record_id(n: u64) -> String {
    format!("00000000-0000-4000-8000-{n:012x}")
}

#[tokio::test]
async fn removal_converges_on_accepted_fields() {
    let store = FakeStore::new();
    store.on_fn(Method::Post, "records", |call, _| {
        if body_has(call, "b") {
            Reply::invalid_property("b")
        } else if body_has(call, "c") {
            Reply::invalid_property("c")
        } else {
            Reply::created("records", &record_id(1))
        }
    });
    let writer = AdaptiveWriter::new(Arc::new(store.clone()));
    let payload = WritePayload::new().with("a", 1).with("b", 2).with("c", 3);

    let ok = writer.create("records", payload).await.unwrap();

    assert_eq!(store.count(Method::Post), 3);
    assert_eq!(ok.attempts, 3);
    assert_eq!(ok.accepted, json!({"a": 1}));
    assert_eq!(ok.removed, vec!["b", "c"]);
    assert_eq!(ok.id, Some(record_id(1)));
}

#[tokio::test]
async fn non_convergence_stops_at_attempt_cap() {
    let store = FakeStore::new();
    store.on_fn(Method::Post, "records", |call, _| {
        let first = call
            .body
            .as_ref()
            .and_then(|b| b.as_object())
            .and_then(|o| o.keys().next().cloned())
            .unwrap_or_default();
        Reply::invalid_property(&first)
    });
    let writer = AdaptiveWriter::new(Arc::new(store.clone()));
    let payload = (0..10).fold(WritePayload::new(), |p, i| p.with(format!("f{i}"), i));

    let err = writer.create("records", payload).await.unwrap_err();

    assert_eq!(store.count(Method::Post), 5);
    assert_eq!(err.kind, FailureKind::AttemptsExhausted);
    assert_eq!(err.attempts, 5);
    assert_eq!(err.removed, vec!["f0", "f1", "f2", "f3"]);
    assert_eq!(err.status, Some(400));
}

#[tokio::test]
async fn attempt_cap_is_configurable() {
    let store = FakeStore::new();
    store.on(Method::Post, "records", vec![
        Reply::invalid_property("a"),
        Reply::invalid_property("b"),
    ]);
    let writer = AdaptiveWriter::new(Arc::new(store.clone())).with_max_attempts(2);

    let err = writer
        .create("records", WritePayload::new().with("a", 1).with("b", 2).with("c", 3))
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::AttemptsExhausted);
    assert_eq!(store.count(Method::Post), 2);
}

#[tokio::test]
async fn permission_denied_short_circuits() {
    let store = FakeStore::new();
    store.on(
        Method::Post,
        "records",
        vec![Reply::error(403, "Principal user is missing prvCreate privilege")],
    );
    let writer = AdaptiveWriter::new(Arc::new(store.clone()));

    let err = writer
        .create("records", WritePayload::new().with("a", 1).with("bogus", "y"))
        .await
        .unwrap_err();

    assert_eq!(store.count(Method::Post), 1);
    assert!(err.is_permission_denied());
    assert_eq!(err.status, Some(403));
    assert!(err.removed.is_empty());
}

#[tokio::test]
async fn unidentifiable_bad_payload_stops() {
    let store = FakeStore::new();
    store.on(Method::Post, "records", vec![Reply::error(400, "A validation error occurred.")]);
    let writer = AdaptiveWriter::new(Arc::new(store.clone()));

    let err = writer
        .create("records", WritePayload::new().with("a", 1))
        .await
        .unwrap_err();

    assert_eq!(store.count(Method::Post), 1);
    assert_eq!(err.kind, FailureKind::BadPayloadUnidentifiable);
    assert_eq!(err.detail, "A validation error occurred.");
}

#[tokio::test]
async fn field_not_in_payload_is_bad_payload() {
    let store = FakeStore::new();
    store.on(Method::Post, "records", vec![Reply::invalid_property("elsewhere")]);
    let writer = AdaptiveWriter::new(Arc::new(store.clone()));

    let err = writer
        .create("records", WritePayload::new().with("a", 1))
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::BadPayload);
    assert_eq!(store.count(Method::Post), 1);
}

#[tokio::test]
async fn timeout_is_server_error_without_stripping() {
    let store = FakeStore::new();
    store.on(Method::Post, "records", vec![Reply::Timeout]);
    let writer = AdaptiveWriter::new(Arc::new(store.clone()));

    let err = writer
        .create("records", WritePayload::new().with("a", 1).with("b", 2))
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::ServerError);
    assert_eq!(err.status, None);
    assert_eq!(err.attempts, 1);
    assert!(err.removed.is_empty());
    assert_eq!(store.count(Method::Post), 1);
}

#[tokio::test]
async fn server_and_missing_collection_errors_are_final() {
    let store = FakeStore::new();
    store.on(Method::Post, "broken", vec![Reply::error(500, "Generic SQL error")]);
    store.on(
        Method::Post,
        "missing",
        vec![Reply::error(404, "Resource not found for the segment 'missing'")],
    );
    let writer = AdaptiveWriter::new(Arc::new(store.clone()));

    let broken = writer.create("broken", WritePayload::new().with("a", 1)).await.unwrap_err();
    let missing = writer.create("missing", WritePayload::new().with("a", 1)).await.unwrap_err();

    assert_eq!(broken.kind, FailureKind::ServerError);
    assert_eq!(missing.kind, FailureKind::NotFound);
    assert_eq!(store.count(Method::Post), 2);
}

#[tokio::test]
async fn cancelled_before_start_sends_nothing() {
    let store = FakeStore::new();
    let writer = AdaptiveWriter::new(Arc::new(store.clone()));
    let (handle, signal) = CancelHandle::pair();
    handle.cancel();

    let err = writer
        .create_with_cancel("records", WritePayload::new().with("a", 1), &signal)
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(err.attempts, 0);
    assert_eq!(store.count(Method::Post), 0);
}

#[tokio::test]
async fn cancellation_stops_retries() {
    let store = FakeStore::new();
    let (handle, signal) = CancelHandle::pair();
    store.on_fn(Method::Post, "records", move |_, _| {
        handle.cancel();
        Reply::invalid_property("b")
    });
    let writer = AdaptiveWriter::new(Arc::new(store.clone()));

    let err = writer
        .create_with_cancel("records", WritePayload::new().with("a", 1).with("b", 2), &signal)
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(err.attempts, 1);
    assert_eq!(err.removed, vec!["b"]);
    assert_eq!(store.count(Method::Post), 1);
}

#[tokio::test]
async fn cancellation_interrupts_in_flight_write() {
    let store = FakeStore::new().with_latency(Duration::from_secs(5));
    store.on(Method::Post, "records", vec![Reply::created("records", &record_id(1))]);
    let writer = AdaptiveWriter::new(Arc::new(store));
    let signal = CancelSignal::after(Duration::from_millis(20));

    let err = tokio::time::timeout(
        Duration::from_secs(1),
        writer.create_with_cancel("records", WritePayload::new().with("a", 1), &signal),
    )
    .await
    .unwrap()
    .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(err.attempts, 1);
}

#[tokio::test]
async fn lookup_rejection_removes_bind_key() {
    let store = FakeStore::new();
    store.on_fn(Method::Post, "acme_documents", |call, _| {
        if body_has(call, "acme_batch@odata.bind") {
            Reply::error(
                400,
                "An undeclared property 'acme_batch' which only has property annotations in the payload but no property value was found in the payload. The property named 'acme_batch' does not exist",
            )
        } else {
            Reply::created("acme_documents", &record_id(9))
        }
    });
    let writer = AdaptiveWriter::new(Arc::new(store.clone()));
    let payload = WritePayload::new()
        .with("acme_name", "Handbook")
        .with_lookup("acme_batch", "acme_batches", record_id(3));

    let ok = writer.create("acme_documents", payload).await.unwrap();

    assert_eq!(ok.removed, vec!["acme_batch"]);
    assert_eq!(ok.accepted, json!({"acme_name": "Handbook"}));
}

#[tokio::test]
async fn simulated_store_rejects_unknown_field_once() {
    let store = SimulatedStore::new();
    store.seed_entity("widget", "widgets", &["name", "count", "active"]);
    let writer = AdaptiveWriter::new(Arc::new(store.clone()));
    let payload = WritePayload::new()
        .with("name", "X")
        .with("count", 1)
        .with("active", true)
        .with("bogus", "y");

    let ok = writer.create("widgets", payload).await.unwrap();

    assert_eq!(ok.attempts, 2);
    assert_eq!(ok.removed, vec!["bogus"]);
    assert!(ok.id.is_some());
    let widget = store.entity("widget").unwrap();
    assert_eq!(widget.records.len(), 1);
}

#[tokio::test]
async fn metadata_visible_but_unwritable_field_is_dropped() {
    let store = SimulatedStore::new();
    store.seed_entity("acme_recipient", "acme_recipients", &["acme_name", "acme_email"]);
    store.make_unwritable("acme_recipient", "acme_email");
    let writer = AdaptiveWriter::new(Arc::new(store.clone()));

    let ok = writer
        .create(
            "acme_recipients",
            WritePayload::new().with("acme_name", "Ada").with("acme_email", "ada@example.com"),
        )
        .await
        .unwrap();

    assert_eq!(ok.removed, vec!["acme_email"]);
}

#[tokio::test]
async fn pool_respects_concurrency_and_input_order() {
    let store = FakeStore::new().with_latency(Duration::from_millis(20));
    store.on_fn(Method::Post, "records", |call, _| {
        let n = call
            .body
            .as_ref()
            .and_then(|b| b.get("n"))
            .and_then(serde_json::Value::as_u64)
            .unwrap_or_default();
        Reply::created("records", &record_id(n))
    });
    let writer = Arc::new(AdaptiveWriter::new(Arc::new(store.clone())));
    let pool = WritePool::new(writer).with_concurrency(3);
    let jobs: Vec<WriteJob> = (0..12)
        .map(|n| WriteJob::new("records", WritePayload::new().with("n", n)))
        .collect();

    let outcomes = pool.create_all(jobs, &CancelSignal::never()).await;

    assert_eq!(outcomes.len(), 12);
    for (n, outcome) in (0u64..).zip(&outcomes) {
        assert_eq!(outcome.as_ref().unwrap().id, Some(record_id(n)));
    }
    assert!(store.log().max_in_flight() <= 3);
    assert!(store.log().max_in_flight() > 1);
}

#[tokio::test]
async fn pool_default_limit_is_five() {
    let store = FakeStore::new().with_latency(Duration::from_millis(20));
    store.on(Method::Post, "records", vec![Reply::status(204)]);
    let pool = WritePool::new(Arc::new(AdaptiveWriter::new(Arc::new(store.clone()))));
    let jobs = (0..20)
        .map(|n| WriteJob::new("records", WritePayload::new().with("n", n)))
        .collect();

    let outcomes = pool.create_all(jobs, &CancelSignal::never()).await;

    assert!(outcomes.iter().all(Result::is_ok));
    assert_eq!(pool.concurrency(), 5);
    assert!(store.log().max_in_flight() <= 5);
}

#[tokio::test]
async fn cancelled_pool_fails_remaining_jobs() {
    let store = FakeStore::new();
    store.on(Method::Post, "records", vec![Reply::status(204)]);
    let pool = WritePool::new(Arc::new(AdaptiveWriter::new(Arc::new(store.clone()))));
    let (handle, signal) = CancelHandle::pair();
    handle.cancel();
    let jobs = (0..4)
        .map(|n| WriteJob::new("records", WritePayload::new().with("n", n)))
        .collect();

    let outcomes = pool.create_all(jobs, &signal).await;

    assert!(outcomes.iter().all(|o| o.as_ref().is_err_and(|f| f.is_cancelled())));
    assert_eq!(store.count(Method::Post), 0);
}
