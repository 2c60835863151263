//! Flattening of nested records into dot-path keys.

use serde_json::{Map, Value};

/// Flatten nested objects into a single level keyed by dot paths.
///
/// Arrays stay arrays; objects inside an array are flattened in place.
/// Existing keys are never split, so a key that already contains a dot is
/// kept as it is. An empty nested object is kept under its own key.
///
/// ```rust
/// use busbar_sf_sobject::flatten;
/// use serde_json::json;
///
/// let record = json!({"Owner": {"Address": {"City": "Boise"}}, "Tags": [{"a": {"b": 1}}, 2]});
/// let flat = flatten(record.as_object().unwrap());
///
/// assert_eq!(
///     serde_json::Value::Object(flat),
///     json!({"Owner.Address.City": "Boise", "Tags": [{"a.b": 1}, 2]})
/// );
/// ```
pub fn flatten(value: &Map<String, Value>) -> Map<String, Value> {
    let mut flat = Map::new();
    flatten_into(&mut flat, None, value);
    flat
}

fn flatten_into(flat: &mut Map<String, Value>, prefix: Option<&str>, value: &Map<String, Value>) {
    for (key, item) in value {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.clone(),
        };

        match item {
            Value::Object(nested) if !nested.is_empty() => {
                flatten_into(flat, Some(&path), nested);
            }
            other => {
                flat.insert(path, flatten_element(other));
            }
        }
    }
}

fn flatten_element(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(flatten_element).collect()),
        Value::Object(nested) if !nested.is_empty() => Value::Object(flatten(nested)),
        other => other.clone(),
    }
}
