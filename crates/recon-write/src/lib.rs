//! Recon Write
//!
//! Record writes that converge on the attributes this deployment accepts.
//!
//! # Algorithm
//!
//! 1. Send the payload
//! 2. Success ends the write; any status other than 400 fails it at once
//! 3. A 400 whose diagnostic names a field still in the payload drops that
//!    field and goes back to 1
//! 4. A 400 naming no field, or one already dropped, fails the write
//! 5. At most [`DEFAULT_MAX_ATTEMPTS`] writes are issued per record
//!
//! # Example
//!
//! ```rust,ignore
//! use recon_write::{AdaptiveWriter, WritePayload};
//! use std::sync::Arc;
//!
//! let writer = AdaptiveWriter::new(Arc::new(client));
//! let payload = WritePayload::new()
//!     .with("acme_name", "Q3 acknowledgements")
//!     .with_lookup("acme_business", "acme_businesses", business_id);
//!
//! match writer.create("acme_batches", payload).await {
//!     Ok(ok) => println!("created {:?} after dropping {:?}", ok.id, ok.removed),
//!     Err(failure) => eprintln!("{failure}"),
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod diagnostic;
pub mod error;
pub mod payload;
pub mod pool;
pub mod writer;

pub use diagnostic::{DiagnosticParser, InvalidPropertyParser};
pub use error::{FailureKind, WriteFailure};
pub use payload::{FieldValue, WritePayload};
pub use pool::{BatchStats, WriteJob, WritePool, DEFAULT_CONCURRENCY};
pub use writer::{AdaptiveWriter, WriteOutcome, WriteSuccess, DEFAULT_MAX_ATTEMPTS};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
