//! Recon Catalog
//!
//! Static descriptions of the entities and attributes an application needs
//! in the store, and the metadata payloads that create them.
//!
//! # Example
//!
//! ```rust
//! use recon_catalog::{AttributeKind, AttributeSpec, Catalog, EntitySpec};
//!
//! let catalog = Catalog::new()
//!     .with_entity(
//!         EntitySpec::new("acme_batch", "Batch", "Batches", "acme_name").with_attribute(
//!             AttributeSpec::new("acme_duedate", "Due Date", AttributeKind::DateOnly),
//!         ),
//!     )
//!     .with_entity(
//!         EntitySpec::new("acme_document", "Document", "Documents", "acme_name")
//!             .with_attribute(AttributeSpec::new(
//!                 "acme_batch",
//!                 "Batch",
//!                 AttributeKind::lookup("acme_batch"),
//!             )),
//!     );
//!
//! let order = catalog.dependency_order().unwrap();
//! assert_eq!(order[0].logical_name, "acme_batch");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod catalog;
pub mod definition;
pub mod error;
pub mod metadata;

pub use catalog::Catalog;
pub use definition::{AttributeKind, AttributeSpec, DateTimeBehavior, EntitySpec};
pub use error::CatalogError;
pub use metadata::{attribute_payload, entity_strategies, schema_name, CreationStrategy, Labels};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
