//! Query-only properties resolved through a subquery on a related object.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::comparison::build_comparison;
use crate::error::{Error, Result};

/// A property matched through a related object ("left inner join").
///
/// `localProperty IN (SELECT comparisonProperty FROM name WHERE queryValueProperty = value)`
///
/// Only used to build predicates; it never takes part in record
/// conversion. All four names are required and checked on construction,
/// including when deserialized from
/// `{"localProperty", "relatedObject": {"name", "comparisonProperty", "queryValueProperty"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RelationshipSpec", into = "RelationshipSpec")]
pub struct RelationshipDescriptor {
    local_property: String,
    related_object_name: String,
    related_comparison_property: String,
    related_query_value_property: String,
}

impl RelationshipDescriptor {
    /// Create a descriptor, failing if any name is empty.
    pub fn new(
        local_property: impl Into<String>,
        related_object_name: impl Into<String>,
        related_comparison_property: impl Into<String>,
        related_query_value_property: impl Into<String>,
    ) -> Result<Self> {
        RelationshipSpec {
            local_property: Some(local_property.into()),
            related_object: Some(RelatedObjectSpec {
                name: Some(related_object_name.into()),
                comparison_property: Some(related_comparison_property.into()),
                query_value_property: Some(related_query_value_property.into()),
            }),
        }
        .try_into()
    }

    /// Field of the queried object holding the related key.
    pub fn local_property(&self) -> &str {
        &self.local_property
    }

    /// Related object the subquery selects from.
    pub fn related_object_name(&self) -> &str {
        &self.related_object_name
    }

    /// Field of the related object compared with the local property.
    pub fn related_comparison_property(&self) -> &str {
        &self.related_comparison_property
    }

    /// Field of the related object the query value is matched against.
    pub fn related_query_value_property(&self) -> &str {
        &self.related_query_value_property
    }

    /// Render the subquery comparison for `value`.
    pub fn build_comparison(&self, value: &Value) -> Result<String> {
        Ok(format!(
            "{} IN (SELECT {} FROM {} WHERE {})",
            self.local_property,
            self.related_comparison_property,
            self.related_object_name,
            build_comparison(&self.related_query_value_property, value)?
        ))
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelationshipSpec {
    local_property: Option<String>,
    related_object: Option<RelatedObjectSpec>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelatedObjectSpec {
    name: Option<String>,
    comparison_property: Option<String>,
    query_value_property: Option<String>,
}

impl TryFrom<RelationshipSpec> for RelationshipDescriptor {
    type Error = Error;

    fn try_from(spec: RelationshipSpec) -> Result<Self> {
        let mut missing = Vec::new();
        let mut require = |value: Option<String>, name: &'static str| -> String {
            match value.filter(|v| !v.is_empty()) {
                Some(value) => value,
                None => {
                    missing.push(name);
                    String::new()
                }
            }
        };

        let local_property = require(spec.local_property, "localProperty");
        let (name, comparison_property, query_value_property) = match spec.related_object {
            Some(related) => (
                require(related.name, "relatedObject.name"),
                require(related.comparison_property, "relatedObject.comparisonProperty"),
                require(related.query_value_property, "relatedObject.queryValueProperty"),
            ),
            None => {
                missing.push("relatedObject");
                Default::default()
            }
        };

        if !missing.is_empty() {
            return Err(Error::validation(format!(
                "relationship is missing {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            local_property,
            related_object_name: name,
            related_comparison_property: comparison_property,
            related_query_value_property: query_value_property,
        })
    }
}

impl From<RelationshipDescriptor> for RelationshipSpec {
    fn from(descriptor: RelationshipDescriptor) -> Self {
        Self {
            local_property: Some(descriptor.local_property),
            related_object: Some(RelatedObjectSpec {
                name: Some(descriptor.related_object_name),
                comparison_property: Some(descriptor.related_comparison_property),
                query_value_property: Some(descriptor.related_query_value_property),
            }),
        }
    }
}
