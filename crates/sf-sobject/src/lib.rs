//! # sf-sobject
//!
//! Friendly-name mapping over Salesforce SObjects.
//!
//! Callers describe a record type with a [`PropertyMap`] from their own
//! property names to remote field paths (`"ownerName" => "Owner.Name"`) or
//! to a [`RelationshipDescriptor`] for properties matched through a related
//! object. [`SObjectStorage`] then:
//!
//! - converts records between friendly and remote names
//! - builds SOQL statements from friendly search options
//! - runs queries (following every result page), lookups and single-record writes
//! - sends batch writes to a bulk endpoint
//!
//! Every operation goes through a [`Connection`](busbar_sf_client::Connection),
//! usually `busbar_sf_auth::AuthenticatedConnection`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use busbar_sf_auth::{AuthenticatedConnection, PasswordFlow};
//! use busbar_sf_sobject::{PropertyMap, SObjectStorage};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let map: PropertyMap = serde_json::from_value(json!({
//!         "id": "Id",
//!         "name": "Name",
//!         "streetAddress": {
//!             "localProperty": "Owner__c",
//!             "relatedObject": {
//!                 "name": "Address__c",
//!                 "comparisonProperty": "Person__c",
//!                 "queryValueProperty": "StreetAddress__c"
//!             }
//!         }
//!     }))?;
//!
//!     let pets = SObjectStorage::builder(AuthenticatedConnection::new(PasswordFlow::from_env()?)?)
//!         .object_name("Pet__c")
//!         .property_map(map)
//!         .build()?;
//!
//!     let options = json!({"streetAddress": "7601 Interactive Way"});
//!     for pet in pets.query(options.as_object()).await? {
//!         println!("{pet}");
//!     }
//!     Ok(())
//! }
//! ```

mod comparison;
mod error;
mod flatten;
mod property_map;
mod property_names;
mod relationship;
mod storage;

#[cfg(test)]
mod testing;

pub use comparison::build_comparison;
pub use error::{Error, ErrorKind, Result};
pub use flatten::flatten;
pub use property_map::{PropertyMap, PropertyMapping};
pub use property_names::{capitalize, convert_property_names};
pub use relationship::RelationshipDescriptor;
pub use storage::{
    NotFoundFactory, PropertyMapProvider, RecordId, RemoteFormatOptions, SObjectStorage,
    SObjectStorageBuilder,
};
