//! Response body handling with Salesforce-specific error parsing.

use std::sync::OnceLock;

use crate::error::{Error, ErrorKind, Result};

/// Turn a raw response into a JSON value or a typed error.
///
/// Success responses with an empty body (such as `204 No Content`) yield
/// `Value::Null`.
pub(crate) fn parse_response(status: u16, body: &str) -> Result<serde_json::Value> {
    if !(200..300).contains(&status) {
        return Err(parse_error_response(status, body));
    }

    if body.trim().is_empty() {
        return Ok(serde_json::Value::Null);
    }

    serde_json::from_str(body).map_err(Into::into)
}

/// Parse error response body and convert to appropriate error kind.
pub(crate) fn parse_error_response(status: u16, body: &str) -> Error {
    // Salesforce usually answers with an array of errors
    if let Ok(errors) = serde_json::from_str::<Vec<SalesforceErrorResponse>>(body) {
        if let Some(err) = errors.into_iter().next() {
            return salesforce_error(status, err);
        }
    }

    if let Ok(err) = serde_json::from_str::<SalesforceErrorResponse>(body) {
        return salesforce_error(status, err);
    }

    let message = if body.trim().is_empty() {
        default_reason(status).to_string()
    } else {
        sanitize_error_message(body)
    };

    Error::new(ErrorKind::Http { status, message })
}

fn salesforce_error(status: u16, err: SalesforceErrorResponse) -> Error {
    Error::new(ErrorKind::SalesforceApi {
        status,
        error_code: err.error_code,
        message: sanitize_error_message(&err.message),
        fields: err.fields.unwrap_or_default(),
    })
}

fn default_reason(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        410 => "Gone",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Request failed",
    }
}

fn token_pattern() -> &'static regex_lite::Regex {
    static PATTERN: OnceLock<regex_lite::Regex> = OnceLock::new();
    // Salesforce access tokens: org id prefix "00D...", "!", then the session part
    PATTERN.get_or_init(|| {
        regex_lite::Regex::new(r"00[A-Za-z0-9]{13,}[!][A-Za-z0-9_.]+")
            .expect("token pattern is a valid regex")
    })
}

fn session_pattern() -> &'static regex_lite::Regex {
    static PATTERN: OnceLock<regex_lite::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        regex_lite::Regex::new(r"sid=[A-Za-z0-9]{20,}").expect("session pattern is a valid regex")
    })
}

/// Sanitize an error message to prevent exposing sensitive data.
///
/// Redacts access tokens and session ids, and truncates messages longer
/// than 500 characters.
pub(crate) fn sanitize_error_message(message: &str) -> String {
    const MAX_LENGTH: usize = 500;

    let sanitized = token_pattern().replace_all(message, "[REDACTED_TOKEN]");
    let mut sanitized = session_pattern()
        .replace_all(&sanitized, "sid=[REDACTED]")
        .into_owned();

    if sanitized.len() > MAX_LENGTH {
        let mut cut = MAX_LENGTH;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
        sanitized.push_str("...[truncated]");
    }

    sanitized
}

/// Salesforce API error response format.
#[derive(Debug, serde::Deserialize)]
struct SalesforceErrorResponse {
    #[serde(alias = "errorCode")]
    error_code: String,
    message: String,
    fields: Option<Vec<String>>,
}
