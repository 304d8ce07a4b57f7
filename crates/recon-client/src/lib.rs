//! Recon Store Client
//!
//! Thin authenticated HTTP access to a metadata-driven entity store.
//!
//! # Contract
//!
//! - `get`, `post`, `patch`, `delete` issue exactly one request each
//! - A bearer token from the host's [`TokenProvider`] is attached to every call
//! - Non-2xx statuses come back as ordinary [`StoreResponse`] values
//! - Only transport problems (network, timeout, credential) are errors
//!
//! # Example
//!
//! ```rust,ignore
//! use recon_client::{HttpStoreClient, StaticToken, StoreClient, StoreConfig, paths};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StoreConfig::new("https://org.example.com");
//! let client = HttpStoreClient::new(&config, Arc::new(StaticToken::new("token")))?;
//!
//! let response = client.get(&paths::entity_definition("acme_batch")).await?;
//! println!("{} {:?}", response.status, response.class());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod cancel;
pub mod client;
pub mod config;
pub mod error;
pub mod paths;
pub mod response;
pub mod token;

pub use cancel::{CancelHandle, CancelSignal};
pub use client::{HttpStoreClient, StoreClient};
pub use config::StoreConfig;
pub use error::{ConfigError, StoreError, StoreResult, TokenError};
pub use response::{ResponseBody, StatusClass, StoreResponse};
pub use token::{StaticToken, TokenProvider};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
