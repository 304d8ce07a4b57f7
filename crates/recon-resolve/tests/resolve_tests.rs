use futures::future::join_all;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use recon_client::paths;
use recon_resolve::{
    pick, AttributeResolver, CollectionResolver, CollectionSource, FieldQuery, KnownAttributes,
    ResolveError, RoleBinding, RoleBindings, SchemaCache,
};
use recon_test_utils::{FakeStore, Method, Reply, SimulatedStore};
use std::sync::Arc;
use std::time::Duration;

fn document_bindings() -> Arc<RoleBindings> {
    Arc::new(
        RoleBindings::new().with_binding(
            RoleBinding::new("documents", ["batchdocument", "document"], "acme_documents")
                .with_default_entity("acme_document"),
        ),
    )
}

fn document_resolver(store: &FakeStore) -> CollectionResolver<FakeStore> {
    CollectionResolver::new(Arc::new(store.clone()), document_bindings(), SchemaCache::default())
}

#[test]
fn candidate_match_wins_over_substring_match() {
    let known: KnownAttributes = ["toba_email", "toba_mail2"].into_iter().collect();
    let query = FieldQuery::new()
        .with_preferred("toba_Email")
        .with_candidate("toba_email")
        .with_substrings(["mail"]);
    assert_eq!(query.pick(&known).as_deref(), Some("toba_email"));

    let substring_only = FieldQuery::new().with_substrings(["mail"]);
    assert_eq!(substring_only.pick(&known).as_deref(), Some("toba_email"));
}

#[tokio::test]
async fn no_match_falls_back_to_configured_default() {
    let store = FakeStore::new();
    store.on(Method::Get, "EntityDefinitions*", vec![Reply::entities(&[])]);
    let resolver = document_resolver(&store);

    let resolved = resolver.resolve("documents").await.unwrap();

    assert_eq!(resolved.collection_id, "acme_documents");
    assert_eq!(resolved.logical_name.as_deref(), Some("acme_document"));
    assert_eq!(resolved.source, CollectionSource::Fallback);
    assert_eq!(store.count(Method::Get), 2);
}

#[tokio::test]
async fn timed_out_lookup_is_an_error_and_not_cached() {
    let store = FakeStore::new();
    store.on(
        Method::Get,
        &paths::entities_ending_with("batchdocument"),
        vec![
            Reply::Timeout,
            Reply::entities(&[("toba_batchdocument", "toba_batchdocuments")]),
        ],
    );
    let resolver = document_resolver(&store);

    let err = resolver.resolve("documents").await.unwrap_err();
    assert!(matches!(err, ResolveError::Lookup { status: None, .. }));

    let resolved = resolver.resolve("documents").await.unwrap();
    assert_eq!(resolved.collection_id, "toba_batchdocuments");
    assert_eq!(resolved.source, CollectionSource::Discovered);
    assert_eq!(store.count(Method::Get), 2);
}

#[tokio::test]
async fn rejected_lookup_is_an_error_not_a_fallback() {
    let store = FakeStore::new();
    store.on(Method::Get, "EntityDefinitions*", vec![Reply::error(500, "busy")]);
    let resolver = document_resolver(&store);

    let err = resolver.resolve("documents").await.unwrap_err();
    assert!(matches!(err, ResolveError::Lookup { status: Some(500), .. }));
    assert!(resolver.resolve("documents").await.is_err());
    assert_eq!(store.count(Method::Get), 2);
}

#[tokio::test]
async fn first_suffix_with_matches_wins() {
    let store = FakeStore::new();
    store.on(
        Method::Get,
        &paths::entities_ending_with("batchdocument"),
        vec![Reply::entities(&[("x_batchdocument", "x_batchdocuments")])],
    );
    store.on(
        Method::Get,
        &paths::entities_ending_with("document"),
        vec![Reply::entities(&[("acme_document", "acme_documents")])],
    );
    let resolver = document_resolver(&store);

    let resolved = resolver.resolve("documents").await.unwrap();
    assert_eq!(resolved.collection_id, "x_batchdocuments");
    assert_eq!(resolved.source, CollectionSource::Discovered);
    assert_eq!(store.count(Method::Get), 1);
}

#[tokio::test]
async fn resolution_is_cached_per_session() {
    let store = SimulatedStore::new();
    store.seed_entity("acme_document", "acme_documents", &[]);
    let client = Arc::new(store.clone());
    let resolver =
        CollectionResolver::new(client.clone(), document_bindings(), SchemaCache::default());

    let first = resolver.resolve("documents").await.unwrap();
    let second = resolver.resolve("documents").await.unwrap();
    assert_eq!(first, second);
    let lookups = store.count(Method::Get);

    let next_session = CollectionResolver::new(client, document_bindings(), SchemaCache::default());
    next_session.resolve("documents").await.unwrap();
    assert!(store.count(Method::Get) > lookups);
}

#[tokio::test]
async fn concurrent_resolves_issue_one_lookup() {
    let store = FakeStore::new().with_latency(Duration::from_millis(50));
    store.on(
        Method::Get,
        "EntityDefinitions*",
        vec![Reply::entities(&[("acme_batchdocument", "acme_batchdocuments")])],
    );
    let resolver = document_resolver(&store);

    let results = join_all((0..8).map(|_| resolver.resolve("documents"))).await;

    assert!(results
        .iter()
        .all(|r| r.as_ref().unwrap().collection_id == "acme_batchdocuments"));
    assert_eq!(store.count(Method::Get), 1);
}

#[tokio::test]
async fn concurrent_field_resolution_lists_once() {
    let store = FakeStore::new().with_latency(Duration::from_millis(50));
    store.on(
        Method::Get,
        &paths::attribute_names("acme_recipient"),
        vec![Reply::names(&["acme_name", "acme_email"])],
    );
    let resolver = AttributeResolver::new(Arc::new(store.clone()), SchemaCache::default());
    let query = FieldQuery::new().with_substrings(["mail"]);

    let results = join_all((0..8).map(|_| resolver.resolve_field("acme_recipient", &query))).await;

    assert!(results
        .into_iter()
        .all(|r| r.unwrap().as_deref() == Some("acme_email")));
    assert_eq!(store.count(Method::Get), 1);
}

#[tokio::test]
async fn unknown_role_is_an_error() {
    let resolver = CollectionResolver::new(
        Arc::new(FakeStore::new()),
        document_bindings(),
        SchemaCache::default(),
    );
    let err = resolver.resolve("invoices").await.unwrap_err();
    assert!(err.is_unknown_role());
}

fn name() -> impl Strategy<Value = String> {
    "[a-z]{1,3}(_[a-zA-Z]{1,4})?"
}

proptest! {
    #[test]
    fn picked_name_is_always_known(
        known in prop::collection::vec(name(), 0..8),
        preferred in prop::option::of(name()),
        candidates in prop::collection::vec(name(), 0..4),
        substrings in prop::collection::vec("[a-z]{0,2}", 0..3),
    ) {
        let set: KnownAttributes = known.iter().cloned().collect();
        if let Some(picked) = pick(&set, preferred.as_deref(), &candidates, &substrings) {
            prop_assert!(set.contains(&picked));
        }
    }

    #[test]
    fn candidate_order_is_respected(
        known in prop::collection::vec(name(), 1..8),
        candidates in prop::collection::vec(name(), 1..6),
    ) {
        let set: KnownAttributes = known.iter().cloned().collect();
        let expected = candidates.iter().find(|c| set.contains(c)).cloned();
        let picked = pick(&set, None, &candidates, &[]);
        prop_assert_eq!(picked, expected);
    }

    #[test]
    fn known_preferred_always_wins(
        known in prop::collection::vec(name(), 1..8),
        index in any::<prop::sample::Index>(),
        candidates in prop::collection::vec(name(), 0..4),
    ) {
        let set: KnownAttributes = known.iter().cloned().collect();
        let preferred = index.get(&known).clone();
        let picked = pick(&set, Some(preferred.as_str()), &candidates, &candidates);
        prop_assert_eq!(picked, Some(preferred));
    }

    #[test]
    fn pick_is_deterministic(
        known in prop::collection::vec(name(), 0..8),
        substrings in prop::collection::vec("[a-z_]{1,2}", 0..3),
    ) {
        let set: KnownAttributes = known.iter().cloned().collect();
        let first = pick::<String>(&set, None, &[], &substrings);
        let second = pick::<String>(&set, None, &[], &substrings);
        prop_assert_eq!(first, second);
    }
}
