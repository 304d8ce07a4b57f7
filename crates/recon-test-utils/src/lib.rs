//! Testing utilities for the Recon workspace
//!
//! Fake stores, fixtures and shared assertions.

#![allow(missing_docs)]

pub mod fake;
pub mod recording;
pub mod simulated;

pub use fake::{FakeStore, Reply};
pub use recording::{Call, CallLog, Method};
pub use simulated::{SimEntity, SimulatedStore};

use recon_catalog::{AttributeKind, AttributeSpec, Catalog, EntitySpec};

/// `widget` with `name: String(100)`, `count: Integer`, `active: Boolean`
pub fn widget_entity() -> EntitySpec {
    EntitySpec::new("widget", "Widget", "Widgets", "widgetname")
        .with_attribute(AttributeSpec::new("name", "Name", AttributeKind::string(100)))
        .with_attribute(AttributeSpec::new("count", "Count", AttributeKind::integer()))
        .with_attribute(AttributeSpec::new("active", "Active", AttributeKind::Boolean))
}

/// Catalog holding only [`widget_entity`]
pub fn widget_catalog() -> Catalog {
    Catalog::new().with_entity(widget_entity())
}

/// Two-entity catalog where `acme_document` looks up `acme_batch`
pub fn batch_document_catalog() -> Catalog {
    Catalog::new()
        .with_entity(
            EntitySpec::new("acme_document", "Document", "Documents", "acme_name")
                .with_attribute(AttributeSpec::new(
                    "acme_batch",
                    "Batch",
                    AttributeKind::lookup("acme_batch"),
                ))
                .with_attribute(AttributeSpec::new("acme_url", "Url", AttributeKind::url(500))),
        )
        .with_entity(
            EntitySpec::new("acme_batch", "Batch", "Batches", "acme_name").with_attribute(
                AttributeSpec::new("acme_duedate", "Due Date", AttributeKind::DateOnly),
            ),
        )
}
