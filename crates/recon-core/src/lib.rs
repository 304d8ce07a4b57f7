//! Recon Core
//!
//! The engine facade: schema reconciliation and adaptive writes against a
//! metadata-driven entity store, for one session at a time.
//!
//! # Flow
//!
//! ```text
//! caller → resolve_collection (per role, cached)
//!        → ensure_entity (at provisioning time, optionally before writes)
//!        → resolve_field (per entity, cached)
//!        → adaptive write (per record)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use recon_client::{CancelSignal, StaticToken, StoreConfig};
//! use recon_core::{app, Engine, EngineConfig, WriteRecord};
//! use std::sync::Arc;
//!
//! let config = EngineConfig::new(StoreConfig::new("https://org.example.com"))
//!     .with_publisher_prefix("toba");
//! let engine = Engine::connect(config, Arc::new(StaticToken::new(token)))?;
//!
//! let log = engine.provision_catalog(&CancelSignal::never()).await;
//! assert!(log.is_success());
//!
//! let record = WriteRecord::new()
//!     .with(engine.field(app::FieldRole::Title), "Q3 policies")
//!     .with(engine.field(app::FieldRole::DueDate), "2026-10-31");
//! let outcome = engine.create_record(app::BATCHES, &record).await?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod app;
pub mod config;
pub mod engine;
pub mod error;
pub mod record;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use record::{navigation_property, RecordValue, WriteRecord};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
