//! # busbar-sf-mapper
//!
//! Friendly-name access to Salesforce SObjects.
//!
//! Records are read and written under caller-chosen property names; the
//! library translates them to remote field paths, synthesizes SOQL from
//! search options and sends requests through a connection that renews its
//! credential and retries transient failures.
//!
//! ## Security
//!
//! - Sensitive data (tokens, secrets) are redacted in Debug output
//! - Tracing/logging skips credential parameters
//! - Error messages sanitize any credential data
//!
//! ## Crates
//!
//! - **busbar-sf-client** - HTTP transport, the `Connection` seam, retry with backoff
//! - **busbar-sf-auth** - OAuth 2.0 and JWT credential sources, `AuthenticatedConnection`
//! - **busbar-sf-sobject** - Property maps, SOQL synthesis, CRUD and bulk storage
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use busbar_sf_mapper::{AuthenticatedConnection, PasswordFlow, PropertyMap, SObjectStorage};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let connection = AuthenticatedConnection::new(PasswordFlow::from_env()?)?;
//!
//!     let pets = SObjectStorage::builder(connection)
//!         .object_name("Pet__c")
//!         .property_map(PropertyMap::new().with("id", "Id").with("name", "Name"))
//!         .build()?;
//!
//!     let created = pets.insert(&json!({"name": "Rex"})).await?;
//!     let rex = pets.get(json!({"id": created.id}).as_object().unwrap()).await?;
//!     println!("{rex}");
//!
//!     Ok(())
//! }
//! ```

#[cfg(feature = "auth")]
pub use busbar_sf_auth as auth;
#[cfg(feature = "client")]
pub use busbar_sf_client as client;
#[cfg(feature = "sobject")]
pub use busbar_sf_sobject as sobject;

#[cfg(feature = "auth")]
pub use busbar_sf_auth::{AuthenticatedConnection, PasswordFlow, SalesforceCredentials};
#[cfg(feature = "client")]
pub use busbar_sf_client::{Connection, RequestOptions, SfHttpClient};
#[cfg(feature = "sobject")]
pub use busbar_sf_sobject::{PropertyMap, RelationshipDescriptor, SObjectStorage};
