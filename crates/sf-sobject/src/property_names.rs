//! Renaming record keys through a name map.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::flatten::flatten;

/// Rename the keys of a record, or of every record in an array.
///
/// Records are flattened first, so nested fields are looked up by their
/// dot path. Mapped keys take their target name; unmapped keys are kept,
/// capitalized when `capitalize_unmapped` is set. Array elements that are
/// not objects pass through unchanged.
///
/// Fails with a validation error when `entity` is neither an object nor an
/// array.
pub fn convert_property_names(
    entity: &Value,
    names: &BTreeMap<String, String>,
    capitalize_unmapped: bool,
) -> Result<Value> {
    match entity {
        Value::Object(record) => Ok(Value::Object(rename_keys(
            record,
            names,
            capitalize_unmapped,
        ))),
        Value::Array(items) => Ok(Value::Array(
            items
                .iter()
                .map(|item| match item {
                    Value::Object(record) => {
                        Value::Object(rename_keys(record, names, capitalize_unmapped))
                    }
                    other => other.clone(),
                })
                .collect(),
        )),
        Value::Null => Err(Error::validation("entity is required")),
        _ => Err(Error::validation("entity must be an object or an array")),
    }
}

fn rename_keys(
    record: &Map<String, Value>,
    names: &BTreeMap<String, String>,
    capitalize_unmapped: bool,
) -> Map<String, Value> {
    let mut renamed = Map::new();

    for (key, value) in flatten(record) {
        let target = match names.get(&key) {
            Some(target) => target.clone(),
            None if capitalize_unmapped => capitalize(&key),
            None => key,
        };
        renamed.insert(target, value);
    }

    renamed
}

/// Upper-case the first character.
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
