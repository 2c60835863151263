//! Friendly-name storage for one SObject type.
//!
//! [`SObjectStorage`] owns the property map of an object, converts records
//! between friendly and remote field names, synthesizes SOQL statements and
//! performs CRUD and bulk operations over any [`Connection`].
//!
//! Request URLs are instance-relative (`/services/data/...`), so the
//! connection is expected to resolve them, as
//! `busbar_sf_auth::AuthenticatedConnection` does.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::Arc;

use busbar_sf_client::{Connection, DEFAULT_API_VERSION};
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::error;

use crate::comparison::build_comparison;
use crate::error::{Error, Result};
use crate::property_map::PropertyMap;
use crate::property_names::convert_property_names;

mod bulk;
mod crud;
mod query;

/// Asynchronous source of the property map, called once per operation.
pub type PropertyMapProvider =
    Arc<dyn Fn() -> BoxFuture<'static, Result<PropertyMap>> + Send + Sync>;

/// Builds the error returned by `get` when nothing matches. Receives the
/// object name and the search options.
pub type NotFoundFactory = Arc<dyn Fn(&str, &Value) -> Error + Send + Sync>;

#[derive(Clone)]
enum ObjectName {
    Static(String),
    Computed(Arc<dyn Fn() -> String + Send + Sync>),
}

#[derive(Clone)]
enum PropertyMapSource {
    Static(Arc<PropertyMap>),
    Provider(PropertyMapProvider),
}

/// Options of [`SObjectStorage::convert_to_remote`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoteFormatOptions {
    /// Attach `attributes: {type: <object name>}`.
    pub include_type_attribute: bool,
    /// Keep dot-path fields of related objects.
    pub include_nested_properties: bool,
}

/// Identifier returned by write operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId {
    pub id: String,
}

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Storage of one SObject type addressed by friendly property names.
///
/// # Example
///
/// ```rust,ignore
/// use busbar_sf_auth::{AuthenticatedConnection, PasswordFlow};
/// use busbar_sf_sobject::{PropertyMap, SObjectStorage};
/// use serde_json::json;
///
/// let connection = AuthenticatedConnection::new(PasswordFlow::from_env()?)?;
/// let pets = SObjectStorage::builder(connection)
///     .object_name("Pet__c")
///     .property_map(PropertyMap::new().with("id", "Id").with("name", "Name"))
///     .build()?;
///
/// let created = pets.insert(&json!({"name": "Rex"})).await?;
/// let rex = pets.get(json!({"id": created.id}).as_object().unwrap()).await?;
/// ```
pub struct SObjectStorage<C> {
    connection: C,
    object_name: Option<ObjectName>,
    property_map: Option<PropertyMapSource>,
    api_version: String,
    bulk_path: Option<String>,
    not_found: NotFoundFactory,
}

impl<C: std::fmt::Debug> std::fmt::Debug for SObjectStorage<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let object_name = match &self.object_name {
            Some(ObjectName::Static(name)) => Some(name.as_str()),
            Some(ObjectName::Computed(_)) => Some("<computed>"),
            None => None,
        };
        f.debug_struct("SObjectStorage")
            .field("connection", &self.connection)
            .field("object_name", &object_name)
            .field("api_version", &self.api_version)
            .field("bulk_path", &self.bulk_path)
            .finish_non_exhaustive()
    }
}

impl<C: Connection> SObjectStorage<C> {
    /// Start configuring a storage over `connection`.
    pub fn builder(connection: C) -> SObjectStorageBuilder<C> {
        SObjectStorageBuilder::new(connection)
    }

    /// Get the underlying connection.
    pub fn connection(&self) -> &C {
        &self.connection
    }

    /// Get the API version.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Name of the SObject type.
    pub fn object_name(&self) -> Result<String> {
        match &self.object_name {
            Some(ObjectName::Static(name)) => Ok(name.clone()),
            Some(ObjectName::Computed(name)) => Ok(name()),
            None => Err(Error::not_implemented("object name is not configured")),
        }
    }

    /// Current property map.
    pub async fn property_map(&self) -> Result<Arc<PropertyMap>> {
        match &self.property_map {
            Some(PropertyMapSource::Static(map)) => Ok(Arc::clone(map)),
            Some(PropertyMapSource::Provider(provider)) => Ok(Arc::new(provider().await?)),
            None => Err(Error::not_implemented("property map is not configured")),
        }
    }

    /// Remote field to friendly name, without relationships.
    pub async fn reverse_property_map(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.property_map().await?.reverse())
    }

    /// Friendly property names, sorted.
    pub async fn property_names(&self) -> Result<Vec<String>> {
        Ok(self.property_map().await?.property_names())
    }

    /// Remote field names, sorted and de-duplicated.
    pub async fn remote_property_names(&self) -> Result<Vec<String>> {
        Ok(self.property_map().await?.remote_property_names())
    }

    /// Convert a friendly record to remote field names.
    ///
    /// Fields without a mapping are dropped, as are dot-path fields unless
    /// `include_nested_properties` is set. Relationship properties never
    /// appear in the result.
    pub async fn convert_to_remote(
        &self,
        entity: &Value,
        options: RemoteFormatOptions,
    ) -> Result<Value> {
        async {
            let map = self.property_map().await?;
            let object_name = self.type_attribute_name(options)?;
            to_remote(&map, entity, object_name.as_deref(), options).map(Value::Object)
        }
        .await
        .map_err(|err| self.report("convert_to_remote", entity, err))
    }

    /// Convert a remote record to friendly names, keeping only declared properties.
    pub async fn convert_from_remote(&self, entity: &Value) -> Result<Value> {
        async {
            let map = self.property_map().await?;
            from_remote(&map, entity).map(Value::Object)
        }
        .await
        .map_err(|err| self.report("convert_from_remote", entity, err))
    }

    /// Convert an array of friendly records to remote field names.
    pub async fn convert_array_to_remote(
        &self,
        entities: &Value,
        options: RemoteFormatOptions,
    ) -> Result<Value> {
        async {
            let entities = require_array(entities)?;
            let map = self.property_map().await?;
            let object_name = self.type_attribute_name(options)?;
            entities
                .iter()
                .map(|entity| {
                    to_remote(&map, entity, object_name.as_deref(), options).map(Value::Object)
                })
                .collect::<Result<Vec<_>>>()
                .map(Value::Array)
        }
        .await
        .map_err(|err| self.report("convert_array_to_remote", entities, err))
    }

    /// Convert an array of remote records to friendly names.
    pub async fn convert_array_from_remote(&self, entities: &Value) -> Result<Value> {
        async {
            let entities = require_array(entities)?;
            let map = self.property_map().await?;
            entities
                .iter()
                .map(|entity| from_remote(&map, entity).map(Value::Object))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array)
        }
        .await
        .map_err(|err| self.report("convert_array_from_remote", entities, err))
    }

    /// Build the SOQL statement `query` would send for `options`.
    pub async fn build_query_statement(
        &self,
        options: Option<&Map<String, Value>>,
    ) -> Result<String> {
        async {
            let map = self.property_map().await?;
            query_statement(&map, &self.object_name()?, options)
        }
        .await
        .map_err(|err| self.report("build_query_statement", &options, err))
    }

    fn type_attribute_name(&self, options: RemoteFormatOptions) -> Result<Option<String>> {
        if options.include_type_attribute {
            self.object_name().map(Some)
        } else {
            Ok(None)
        }
    }

    fn data_path(&self, path: &str) -> String {
        format!("/services/data/v{}/{}", self.api_version, path)
    }

    fn bulk_endpoint(&self, object_name: &str) -> String {
        match &self.bulk_path {
            Some(path) => path.clone(),
            None => format!("/services/apexrest/bulk/{object_name}"),
        }
    }

    /// Log a failed operation with its context and hand the error back untouched.
    fn report(&self, operation: &'static str, input: &dyn std::fmt::Debug, err: Error) -> Error {
        let object = self.object_name().ok();
        error!(
            object = object.as_deref().unwrap_or("<unset>"),
            operation,
            input = ?input,
            error = %err,
            "SObject operation failed"
        );
        err
    }
}

/// Builder for [`SObjectStorage`].
pub struct SObjectStorageBuilder<C> {
    connection: C,
    object_name: Option<ObjectName>,
    property_map: Option<PropertyMapSource>,
    api_version: Option<String>,
    bulk_path: Option<String>,
    not_found: Option<NotFoundFactory>,
}

impl<C: Connection> SObjectStorageBuilder<C> {
    fn new(connection: C) -> Self {
        Self {
            connection,
            object_name: None,
            property_map: None,
            api_version: None,
            bulk_path: None,
            not_found: None,
        }
    }

    /// Set a fixed object name.
    pub fn object_name(mut self, name: impl Into<String>) -> Self {
        self.object_name = Some(ObjectName::Static(name.into()));
        self
    }

    /// Compute the object name on every operation.
    pub fn object_name_with<F>(mut self, name: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.object_name = Some(ObjectName::Computed(Arc::new(name)));
        self
    }

    /// Set a fixed property map.
    pub fn property_map(mut self, map: PropertyMap) -> Self {
        self.property_map = Some(PropertyMapSource::Static(Arc::new(map)));
        self
    }

    /// Compute the property map on every operation.
    pub fn property_map_with<F, Fut>(mut self, provider: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<PropertyMap>> + Send + 'static,
    {
        self.property_map = Some(PropertyMapSource::Provider(Arc::new(move || {
            provider().boxed()
        })));
        self
    }

    /// Set the API version (default: `62.0`).
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Set the bulk endpoint path (default: `/services/apexrest/bulk/{object}`).
    pub fn bulk_path(mut self, path: impl Into<String>) -> Self {
        self.bulk_path = Some(path.into());
        self
    }

    /// Replace the error `get` returns when nothing matches.
    pub fn not_found_with<F>(mut self, factory: F) -> Self
    where
        F: Fn(&str, &Value) -> Error + Send + Sync + 'static,
    {
        self.not_found = Some(Arc::new(factory));
        self
    }

    /// Build the storage, validating the API version.
    pub fn build(self) -> Result<SObjectStorage<C>> {
        let api_version = match self.api_version {
            Some(version) => {
                let numeric = version
                    .parse::<f64>()
                    .is_ok_and(|parsed| parsed.is_finite());
                if !numeric {
                    return Err(Error::validation(format!(
                        "API version must be numeric, got {version:?}"
                    )));
                }
                version
            }
            None => DEFAULT_API_VERSION.to_string(),
        };

        let not_found = match self.not_found {
            Some(factory) => factory,
            None => Arc::new(default_not_found) as NotFoundFactory,
        };

        Ok(SObjectStorage {
            connection: self.connection,
            object_name: self.object_name,
            property_map: self.property_map,
            api_version,
            bulk_path: self.bulk_path,
            not_found,
        })
    }
}

fn default_not_found(object_name: &str, options: &Value) -> Error {
    Error::not_found(format!("no {object_name} record matches {options}"))
}

fn require_record(entity: &Value) -> Result<&Map<String, Value>> {
    match entity {
        Value::Object(record) => Ok(record),
        Value::Null => Err(Error::validation("entity is required")),
        _ => Err(Error::validation("entity must be an object")),
    }
}

fn require_array(entities: &Value) -> Result<&Vec<Value>> {
    entities
        .as_array()
        .ok_or_else(|| Error::validation("entities must be an array"))
}

/// Friendly record to remote field names, see [`SObjectStorage::convert_to_remote`].
fn to_remote(
    map: &PropertyMap,
    entity: &Value,
    object_name: Option<&str>,
    options: RemoteFormatOptions,
) -> Result<Map<String, Value>> {
    require_record(entity)?;

    let reverse = map.reverse();
    let Value::Object(converted) = convert_property_names(entity, &map.basic_names(), false)?
    else {
        return Err(Error::validation("entity must be an object"));
    };

    let mut remote: Map<String, Value> = converted
        .into_iter()
        .filter(|(field, _)| {
            reverse.contains_key(field)
                && (options.include_nested_properties || !field.contains('.'))
        })
        .collect();

    if let Some(object_name) = object_name {
        remote.insert(
            "attributes".to_string(),
            serde_json::json!({ "type": object_name }),
        );
    }

    Ok(remote)
}

/// Remote record to friendly names, restricted to declared properties.
fn from_remote(map: &PropertyMap, entity: &Value) -> Result<Map<String, Value>> {
    require_record(entity)?;

    let declared: BTreeSet<String> = map.property_names().into_iter().collect();
    let Value::Object(converted) = convert_property_names(entity, &map.reverse(), false)? else {
        return Err(Error::validation("entity must be an object"));
    };

    Ok(converted
        .into_iter()
        .filter(|(name, _)| declared.contains(name))
        .collect())
}

/// `SELECT <fields> FROM <object> <predicate> ORDER BY CreatedDate DESC`
///
/// An empty predicate leaves two spaces between the object name and
/// `ORDER BY`.
fn query_statement(
    map: &PropertyMap,
    object_name: &str,
    options: Option<&Map<String, Value>>,
) -> Result<String> {
    let fields = map.remote_property_names().join(", ");
    let predicate = predicate(map, options)?;
    Ok(format!(
        "SELECT {fields} FROM {object_name} {predicate} ORDER BY CreatedDate DESC"
    ))
}

/// Basic comparisons sorted by remote field, then relationship subqueries
/// in option order.
fn predicate(map: &PropertyMap, options: Option<&Map<String, Value>>) -> Result<String> {
    let Some(options) = options.filter(|options| !options.is_empty()) else {
        return Ok(String::new());
    };

    let normalized = to_remote(
        map,
        &Value::Object(options.clone()),
        None,
        RemoteFormatOptions {
            include_nested_properties: true,
            ..Default::default()
        },
    )?;

    let mut basic: Vec<(&String, &Value)> = normalized.iter().collect();
    basic.sort_by(|(a, _), (b, _)| a.cmp(b));

    let mut comparisons = basic
        .into_iter()
        .map(|(field, value)| build_comparison(field, value))
        .collect::<Result<Vec<_>>>()?;

    for (friendly, value) in options {
        if let Some(relationship) = map.relationship(friendly) {
            comparisons.push(relationship.build_comparison(value)?);
        }
    }

    if comparisons.is_empty() {
        return Ok(String::new());
    }
    Ok(format!("WHERE {}", comparisons.join(" AND ")))
}

/// Identifier of a returned record, from `id` or `Id`.
fn record_id(record: &Value) -> Option<String> {
    ["id", "Id"]
        .iter()
        .find_map(|field| record.get(field).and_then(Value::as_str))
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// The non-empty string `id` of a friendly record.
fn require_id(entity: &Value) -> Result<String> {
    match entity.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(Error::validation("id is required")),
    }
}
