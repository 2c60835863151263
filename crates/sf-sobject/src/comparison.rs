//! Rendering of field/value pairs into SOQL comparisons.

use busbar_sf_client::security::soql;
use serde_json::Value;

use crate::error::{Error, Result};

/// Render `field = value`, or an OR-group for an array of values.
///
/// Strings are quoted and escaped. Numbers, booleans and null are written
/// bare. Arrays become a parenthesized OR-group so they compose with an
/// outer AND-chain.
///
/// ```rust
/// use busbar_sf_sobject::build_comparison;
/// use serde_json::json;
///
/// assert_eq!(build_comparison("Name", &json!("O'Brien")).unwrap(), "Name = 'O\\'Brien'");
/// assert_eq!(build_comparison("Age__c", &json!(3)).unwrap(), "Age__c = 3");
/// assert_eq!(
///     build_comparison("Name", &json!(["a", "b"])).unwrap(),
///     "(Name = 'a' OR Name = 'b')"
/// );
/// ```
pub fn build_comparison(field: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(text) => Ok(format!("{field} = '{}'", soql::escape_string(text))),
        Value::Number(number) => Ok(format!("{field} = {number}")),
        Value::Bool(flag) => Ok(format!("{field} = {flag}")),
        Value::Null => Ok(format!("{field} = null")),
        Value::Array(values) => {
            if values.is_empty() {
                return Err(Error::validation(format!(
                    "no values to compare {field} against"
                )));
            }
            let comparisons = values
                .iter()
                .map(|value| build_comparison(field, value))
                .collect::<Result<Vec<_>>>()?;
            Ok(format!("({})", comparisons.join(" OR ")))
        }
        Value::Object(_) => Err(Error::validation(format!(
            "cannot compare {field} against an object"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_is_quoted() {
        assert_eq!(
            build_comparison("Name", &json!("Rex")).unwrap(),
            "Name = 'Rex'"
        );
    }

    #[test]
    fn test_quotes_are_escaped() {
        assert_eq!(
            build_comparison("Name", &json!("' OR Name != '")).unwrap(),
            "Name = '\\' OR Name != \\''"
        );
    }

    #[test]
    fn test_scalars_are_bare() {
        assert_eq!(build_comparison("Name", &json!(1234)).unwrap(), "Name = 1234");
        assert_eq!(build_comparison("Weight__c", &json!(2.5)).unwrap(), "Weight__c = 2.5");
        assert_eq!(build_comparison("Active__c", &json!(true)).unwrap(), "Active__c = true");
        assert_eq!(build_comparison("Owner__c", &Value::Null).unwrap(), "Owner__c = null");
    }

    #[test]
    fn test_array_is_or_group() {
        assert_eq!(
            build_comparison("f", &json!(["a", "b"])).unwrap(),
            "(f = 'a' OR f = 'b')"
        );
        assert_eq!(
            build_comparison("f", &json!([1, "b"])).unwrap(),
            "(f = 1 OR f = 'b')"
        );
        assert_eq!(build_comparison("f", &json!(["a"])).unwrap(), "(f = 'a')");
    }

    #[test]
    fn test_empty_array_and_object_are_rejected() {
        assert!(matches!(
            build_comparison("f", &json!([])).unwrap_err().kind,
            crate::ErrorKind::Validation(_)
        ));
        assert!(matches!(
            build_comparison("f", &json!({"a": 1})).unwrap_err().kind,
            crate::ErrorKind::Validation(_)
        ));
    }
}
