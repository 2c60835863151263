//! Friendly property names and what they map to.

use std::collections::btree_map::{self, BTreeMap};
use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::relationship::RelationshipDescriptor;

/// What a friendly property maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PropertyMapping {
    /// A remote field path, dot-delimited for related fields.
    Basic(String),
    /// A query-only property matched through a related object.
    Join(RelationshipDescriptor),
}

impl<'de> Deserialize<'de> for PropertyMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error as _;

        match Value::deserialize(deserializer)? {
            Value::String(remote) => Ok(PropertyMapping::Basic(remote)),
            value @ Value::Object(_) => serde_json::from_value(value)
                .map(PropertyMapping::Join)
                .map_err(D::Error::custom),
            other => Err(D::Error::custom(format!(
                "expected a remote field name or a relationship, found {other}"
            ))),
        }
    }
}

impl From<&str> for PropertyMapping {
    fn from(remote: &str) -> Self {
        PropertyMapping::Basic(remote.to_string())
    }
}

impl From<String> for PropertyMapping {
    fn from(remote: String) -> Self {
        PropertyMapping::Basic(remote)
    }
}

impl From<RelationshipDescriptor> for PropertyMapping {
    fn from(descriptor: RelationshipDescriptor) -> Self {
        PropertyMapping::Join(descriptor)
    }
}

/// Mapping from friendly property names to remote fields or relationships.
///
/// Friendly names are unique; several of them may map to the same remote
/// field. Deserializes from a JSON object whose values are either remote
/// field names or relationship objects:
///
/// ```rust
/// use busbar_sf_sobject::PropertyMap;
///
/// let map: PropertyMap = serde_json::from_str(r#"{
///     "id": "Id",
///     "name": "Name",
///     "ownerName": "Owner.Name",
///     "streetAddress": {
///         "localProperty": "Owner__c",
///         "relatedObject": {
///             "name": "Address__c",
///             "comparisonProperty": "Person__c",
///             "queryValueProperty": "StreetAddress__c"
///         }
///     }
/// }"#).unwrap();
///
/// assert_eq!(map.remote_property_names(), vec!["Id", "Name", "Owner.Name"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyMap {
    entries: BTreeMap<String, PropertyMapping>,
}

impl PropertyMap {
    /// Create an empty property map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a property.
    pub fn with(mut self, friendly: impl Into<String>, mapping: impl Into<PropertyMapping>) -> Self {
        self.insert(friendly, mapping);
        self
    }

    /// Add or replace a property.
    pub fn insert(&mut self, friendly: impl Into<String>, mapping: impl Into<PropertyMapping>) {
        self.entries.insert(friendly.into(), mapping.into());
    }

    /// Mapping of a friendly property.
    pub fn get(&self, friendly: &str) -> Option<&PropertyMapping> {
        self.entries.get(friendly)
    }

    /// Relationship of a friendly property, if it is one.
    pub fn relationship(&self, friendly: &str) -> Option<&RelationshipDescriptor> {
        match self.entries.get(friendly) {
            Some(PropertyMapping::Join(descriptor)) => Some(descriptor),
            _ => None,
        }
    }

    /// Iterate over properties in friendly-name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, PropertyMapping> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Friendly name to remote field, without relationships.
    pub fn basic_names(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .filter_map(|(friendly, mapping)| match mapping {
                PropertyMapping::Basic(remote) => Some((friendly.clone(), remote.clone())),
                PropertyMapping::Join(_) => None,
            })
            .collect()
    }

    /// Remote field to friendly name, without relationships.
    ///
    /// When several friendly names share a remote field, the one that sorts
    /// last wins.
    pub fn reverse(&self) -> BTreeMap<String, String> {
        self.basic_names()
            .into_iter()
            .map(|(friendly, remote)| (remote, friendly))
            .collect()
    }

    /// All friendly names, sorted.
    pub fn property_names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Remote fields of the basic properties, sorted and de-duplicated.
    pub fn remote_property_names(&self) -> Vec<String> {
        self.entries
            .values()
            .filter_map(|mapping| match mapping {
                PropertyMapping::Basic(remote) => Some(remote.clone()),
                PropertyMapping::Join(_) => None,
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl<K: Into<String>, M: Into<PropertyMapping>> FromIterator<(K, M)> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = (K, M)>>(iter: I) -> Self {
        let mut map = PropertyMap::new();
        for (friendly, mapping) in iter {
            map.insert(friendly, mapping);
        }
        map
    }
}
