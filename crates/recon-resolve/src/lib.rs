//! Recon Resolve
//!
//! Late binding of application names onto whatever this deployment has.
//!
//! - [`CollectionResolver`] maps a role ("documents") to a collection identifier
//! - [`AttributeResolver`] maps a field role to an attribute present on an entity
//! - [`SchemaCache`] holds both for one session and coalesces concurrent lookups
//!
//! # Example
//!
//! ```rust,ignore
//! use recon_resolve::{
//!     AttributeResolver, CollectionResolver, FieldQuery, RoleBinding, RoleBindings, SchemaCache,
//! };
//! use std::sync::Arc;
//!
//! let bindings = Arc::new(RoleBindings::new().with_binding(
//!     RoleBinding::new("documents", ["batchdocument", "document"], "acme_documents"),
//! ));
//! let cache = SchemaCache::default();
//! let collections = CollectionResolver::new(client.clone(), bindings, cache.clone());
//! let attributes = AttributeResolver::new(client, cache);
//!
//! let documents = collections.resolve("documents").await?;
//! let entity = documents.logical_name.as_deref().unwrap_or("acme_document");
//! let title = attributes
//!     .resolve_field(entity, &FieldQuery::new().with_candidates(["acme_title", "acme_name"]))
//!     .await?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod attribute;
pub mod binding;
pub mod cache;
pub mod collection;
pub mod error;
pub mod picker;

pub use attribute::AttributeResolver;
pub use binding::{RoleBinding, RoleBindings};
pub use cache::{CacheStats, CollectionSource, ResolvedCollection, SchemaCache, DEFAULT_CAPACITY};
pub use collection::{is_exact_match, select_match, CollectionResolver, EntityMatch};
pub use error::{ResolveError, ResolveResult};
pub use picker::{pick, FieldQuery, KnownAttributes};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
