//! Recon Provision
//!
//! Idempotent creation of the entities and attributes a catalog declares.
//!
//! # Guarantees
//!
//! - An existing entity or attribute is detected by a metadata probe and
//!   never recreated or altered
//! - Entity creation tries several payload shapes in a fixed order
//! - Permission failures stop the current entity without trying more shapes
//! - A catalog pass records every step instead of stopping at the first failure
//!
//! # Example
//!
//! ```rust,ignore
//! use recon_provision::Provisioner;
//! use std::sync::Arc;
//!
//! let provisioner = Provisioner::new(Arc::new(client));
//! let log = provisioner.provision(&catalog).await;
//! for step in &log {
//!     println!("{step}");
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod ensurer;
pub mod error;
pub mod log;
pub mod provisioner;

pub use ensurer::{AttributeOutcome, EnsuredEntity, EntityEnsurer};
pub use error::{EnsureError, EnsureResult};
pub use log::{attribute_step, entity_step, ProvisionStep, ProvisioningLog};
pub use provisioner::Provisioner;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
