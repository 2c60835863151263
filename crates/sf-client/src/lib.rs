//! # sf-client
//!
//! Core HTTP client infrastructure for Salesforce APIs.
//!
//! This crate provides:
//! - A raw HTTP transport over reqwest with compression and connection pooling
//! - The [`Connection`] seam that authentication and mapping layers build on
//! - A retry combinator with exponential backoff and a caller-supplied predicate
//! - Salesforce-aware error parsing with message sanitization
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Application Layer                        │
//! │  (sf-sobject: friendly-name entity mapping)                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │               AuthenticatedConnection (sf-auth)             │
//! │  - Resolves URLs against the instance URL                   │
//! │  - Attaches and renews the bearer credential                │
//! │  - Retries transient failures                               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SfHttpClient                             │
//! │  - One HTTP request per call                                │
//! │  - JSON bodies, compression, Salesforce error parsing       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use busbar_sf_client::{Connection, RequestOptions, SfHttpClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), busbar_sf_client::Error> {
//!     let client = SfHttpClient::default_client()?;
//!
//!     let limits = client
//!         .request(
//!             RequestOptions::get("https://na1.salesforce.com/services/data/v62.0/limits")
//!                 .bearer_auth("00D..."),
//!         )
//!         .await?;
//!
//!     println!("{limits}");
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod connection;
mod error;
mod request;
mod response;
mod retry;
pub mod security;
mod types;

pub use client::SfHttpClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use connection::Connection;
pub use error::{Error, ErrorKind, Result};
pub use request::{RequestMethod, RequestOptions};
pub use retry::{always_retry, execute_with_retry, RetryConfig};
pub use types::QueryResult;

/// Default Salesforce API version
pub const DEFAULT_API_VERSION: &str = "62.0";

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("busbar-sf-mapper/", env!("CARGO_PKG_VERSION"));
