use pretty_assertions::assert_eq;
use recon_client::{paths, CancelSignal, StoreConfig};
use recon_core::{app, Engine, EngineConfig, EngineError, WriteRecord};
use recon_resolve::{CollectionSource, FieldQuery, ResolveError, RoleBinding, RoleBindings};
use recon_test_utils::{
    batch_document_catalog, widget_catalog, FakeStore, Method, Reply, SimulatedStore,
};
use recon_write::{FailureKind, WritePayload};
use serde_json::json;
use std::sync::Arc;

fn widget_config() -> EngineConfig {
    EngineConfig::new(StoreConfig::new("https://org.example.com")).with_roles(
        RoleBindings::new().with_binding(
            RoleBinding::new("widgets", ["widget"], "widgets").with_default_entity("widget"),
        ),
    )
}

fn batch_document_config() -> EngineConfig {
    EngineConfig::new(StoreConfig::new("https://org.example.com")).with_roles(
        RoleBindings::new()
            .with_binding(
                RoleBinding::new("batches", ["batch"], "acme_batches")
                    .with_default_entity("acme_batch"),
            )
            .with_binding(
                RoleBinding::new("documents", ["batchdocument", "document"], "acme_documents")
                    .with_default_entity("acme_document"),
            ),
    )
}

#[tokio::test]
async fn widget_provisioning_then_adaptive_create() {
    let store = SimulatedStore::new();
    let engine = Engine::new(Arc::new(store.clone()), widget_config());

    let log = engine.provision(&widget_catalog()).await;
    assert!(log.is_success(), "{log}");
    let steps: Vec<_> = log.steps().iter().map(|s| (s.step.as_str(), s.ok)).collect();
    assert_eq!(
        steps,
        vec![
            ("entity widget", true),
            ("attribute widget.name", true),
            ("attribute widget.count", true),
            ("attribute widget.active", true),
        ]
    );

    let payload = WritePayload::new()
        .with("name", "A")
        .with("count", 3)
        .with("active", true)
        .with("bogus", 1);
    let ok = engine.adaptive_create("widgets", payload).await.unwrap();

    assert_eq!(ok.attempts, 2);
    assert_eq!(ok.removed, vec!["bogus"]);
    assert_eq!(ok.accepted, json!({"name": "A", "count": 3, "active": true}));
    let id = ok.id.unwrap();
    assert_eq!(store.entity("widget").unwrap().records.len(), 1);
    assert!(store.entity("widget").unwrap().records.contains_key(&id));
}

#[tokio::test]
async fn records_resolve_fields_against_the_deployment() {
    let store = SimulatedStore::new();
    let engine = Engine::new(Arc::new(store.clone()), widget_config());
    engine.provision(&widget_catalog()).await;

    let record = WriteRecord::new()
        .with(FieldQuery::new().with_preferred("widget_title").with_candidates(["name"]), "A")
        .with(FieldQuery::new().with_substrings(["COUNT"]), 7)
        .with(FieldQuery::exact("colour"), "red");
    let ok = engine.create_record("widgets", &record).await.unwrap().unwrap();

    assert_eq!(ok.attempts, 1);
    assert_eq!(ok.accepted, json!({"name": "A", "count": 7}));
    assert!(ok.removed.is_empty());
}

#[tokio::test]
async fn lookups_bind_to_the_target_role_collection() {
    let store = SimulatedStore::new();
    let engine = Engine::new(Arc::new(store.clone()), batch_document_config());
    let log = engine.provision(&batch_document_catalog()).await;
    assert!(log.is_success(), "{log}");

    let batch = engine
        .create_record("batches", &WriteRecord::new().with(FieldQuery::exact("acme_name"), "Q3"))
        .await
        .unwrap()
        .unwrap();
    let batch_id = batch.id.unwrap();

    let document = WriteRecord::new()
        .with(FieldQuery::exact("acme_name"), "Handbook")
        .with_lookup(FieldQuery::exact("acme_batch"), "batches", batch_id.clone())
        .with(FieldQuery::new().with_substrings(["url"]), "https://files.example/handbook.pdf");
    let ok = engine.create_record("documents", &document).await.unwrap().unwrap();

    assert_eq!(ok.attempts, 1);
    assert_eq!(
        ok.accepted,
        json!({
            "acme_name": "Handbook",
            "acme_Batch@odata.bind": format!("/acme_batches({batch_id})"),
            "acme_url": "https://files.example/handbook.pdf",
        })
    );
}

#[tokio::test]
async fn ensure_before_write_creates_the_entity_once() {
    let store = SimulatedStore::new();
    let config = widget_config().with_ensure_before_write(true);
    let engine = Engine::new(Arc::new(store.clone()), config).with_catalog(widget_catalog());

    let records = vec![
        WriteRecord::new().with(FieldQuery::exact("name"), "A"),
        WriteRecord::new()
            .with(FieldQuery::exact("name"), "B")
            .with(FieldQuery::exact("active"), false),
    ];
    let outcomes = engine
        .create_records("widgets", &records, &CancelSignal::never())
        .await
        .unwrap();

    assert!(outcomes.iter().all(Result::is_ok), "{outcomes:?}");
    let widget = store.entity("widget").unwrap();
    assert_eq!(widget.records.len(), 2);
    for attribute in ["name", "count", "active"] {
        assert!(widget.attributes.contains_key(attribute), "missing {attribute}");
    }
    assert_eq!(store.log().count_path(Method::Post, paths::CREATE_ENTITY_ACTION), 1);
}

#[tokio::test]
async fn writes_skip_ensuring_by_default() {
    let store = SimulatedStore::new();
    let engine =
        Engine::new(Arc::new(store.clone()), widget_config()).with_catalog(widget_catalog());

    let outcome = engine
        .create_record("widgets", &WriteRecord::new().with(FieldQuery::exact("name"), "A"))
        .await;

    assert!(matches!(
        outcome,
        Err(EngineError::Resolve(ResolveError::Listing { status: Some(404), .. }))
    ));
    assert!(store.entity("widget").is_none());
}

#[tokio::test]
async fn unknown_role_is_an_error() {
    let engine = Engine::new(Arc::new(FakeStore::new()), widget_config());

    let err = engine
        .create_record("invoices", &WriteRecord::new())
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Resolve(ref e) if e.is_unknown_role()));
}

#[tokio::test]
async fn sessions_do_not_share_discoveries() {
    let store = FakeStore::new();
    store.on(
        Method::Get,
        &paths::entities_ending_with("widget"),
        vec![Reply::entities(&[("new_widget", "new_widgets")])],
    );
    let engine = Engine::new(Arc::new(store.clone()), widget_config());

    let first = engine.resolve_collection("widgets").await.unwrap();
    let again = engine.resolve_collection("widgets").await.unwrap();
    assert_eq!(first, again);
    assert_eq!(first.collection_id, "new_widgets");
    assert_eq!(first.source, CollectionSource::Discovered);
    assert_eq!(store.count(Method::Get), 1);

    let session = engine.new_session();
    session.resolve_collection("widgets").await.unwrap();
    assert_eq!(store.count(Method::Get), 2);
}

#[tokio::test]
async fn provisioning_forgets_stale_fallbacks() {
    let store = SimulatedStore::new();
    let engine = Engine::new(Arc::new(store.clone()), widget_config());

    let before = engine.resolve_collection("widgets").await.unwrap();
    assert_eq!(before.source, CollectionSource::Fallback);

    engine.provision(&widget_catalog()).await;

    let after = engine.resolve_collection("widgets").await.unwrap();
    assert_eq!(after.source, CollectionSource::Discovered);
    assert_eq!(after.collection_id, "widgets");
}

#[tokio::test]
async fn batch_writes_return_outcomes_in_order() {
    let store = SimulatedStore::new();
    store.seed_entity("widget", "widgets", &["name"]);
    store.make_unwritable("widget", "name");
    let engine = Engine::new(Arc::new(store.clone()), widget_config().with_write_concurrency(2));

    let records: Vec<_> = (0..4)
        .map(|i| WriteRecord::new().with(FieldQuery::exact("name"), format!("w{i}")))
        .collect();
    let outcomes = engine
        .create_records("widgets", &records, &CancelSignal::never())
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 4);
    for outcome in &outcomes {
        let ok = outcome.as_ref().unwrap();
        assert_eq!(ok.removed, vec!["name"]);
        assert_eq!(ok.accepted, json!({}));
    }
    assert!(store.log().max_in_flight() <= 2);
}

#[tokio::test]
async fn cancelled_batch_writes_nothing() {
    let store = SimulatedStore::new();
    store.seed_entity("widget", "widgets", &["name"]);
    let engine = Engine::new(Arc::new(store.clone()), widget_config());
    let (handle, signal) = recon_client::CancelHandle::pair();
    handle.cancel();

    let outcomes = engine
        .create_records(
            "widgets",
            &[WriteRecord::new().with(FieldQuery::exact("name"), "A")],
            &signal,
        )
        .await
        .unwrap();

    assert_eq!(outcomes[0].as_ref().unwrap_err().kind, FailureKind::Cancelled);
    assert_eq!(store.count(Method::Post), 0);
}

#[tokio::test]
async fn application_catalog_provisions_against_a_fresh_store() {
    let store = SimulatedStore::new();
    let config = widget_config().with_publisher_prefix("toba");
    let engine = Engine::new(Arc::new(store.clone()), config);

    let log = engine.provision_catalog(&CancelSignal::never()).await;

    assert!(log.is_success(), "{log}");
    assert_eq!(
        store.entity_names(),
        vec!["toba_business", "toba_batch", "toba_document", "toba_recipient"]
    );
    assert_eq!(engine.field(app::FieldRole::Email).preferred.as_deref(), Some("toba_email"));
}
