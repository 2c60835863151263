//! Escaping helpers for values placed into SOQL statements and URL paths.
//!
//! ```rust
//! use busbar_sf_client::security::{soql, url};
//!
//! let name = soql::escape_string("O'Brien");
//! let statement = format!("SELECT Id FROM Pet__c WHERE Name = '{}'", name);
//! assert_eq!(statement, "SELECT Id FROM Pet__c WHERE Name = 'O\\'Brien'");
//!
//! let path = format!("sobjects/Pet__c/{}", url::encode_param("a00/../x"));
//! assert_eq!(path, "sobjects/Pet__c/a00%2F..%2Fx");
//! ```

/// SOQL escaping utilities.
pub mod soql {
    /// Escape a string value for use inside a quoted SOQL literal.
    ///
    /// Escapes single quotes, backslashes, newlines, carriage returns and
    /// tabs.
    ///
    /// ```rust
    /// use busbar_sf_client::security::soql;
    ///
    /// assert_eq!(soql::escape_string("O'Brien & Co."), "O\\'Brien & Co.");
    /// ```
    #[must_use]
    pub fn escape_string(value: &str) -> String {
        let mut escaped = String::with_capacity(value.len() + 16);
        for ch in value.chars() {
            match ch {
                '\'' => escaped.push_str("\\'"),
                '\\' => escaped.push_str("\\\\"),
                '\n' => escaped.push_str("\\n"),
                '\r' => escaped.push_str("\\r"),
                '\t' => escaped.push_str("\\t"),
                _ => escaped.push(ch),
            }
        }
        escaped
    }
}

/// URL encoding utilities for parameter safety.
pub mod url {
    /// URL-encode a value placed into a path segment, such as a record id.
    #[must_use]
    pub fn encode_param(value: &str) -> String {
        urlencoding::encode(value).into_owned()
    }
}
