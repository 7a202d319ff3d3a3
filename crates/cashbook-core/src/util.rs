//! Small helpers shared by the config, models and HTTP client.

use serde::Deserialize;
use serde_json::Value;

const MAX_MESSAGE_CHARS: usize = 180;

/// Normalize optional text by trimming whitespace and removing empties.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Trim an API base URL and drop trailing slashes.
///
/// `None` unless the value is an `http://` or `https://` URL.
pub fn normalize_http_base_url(value: &str) -> Option<String> {
    let trimmed = value.trim().trim_end_matches('/');
    let has_scheme = trimmed.starts_with("http://") || trimmed.starts_with("https://");
    has_scheme.then(|| trimmed.to_string())
}

/// Truncate text for error messages.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(MAX_MESSAGE_CHARS).collect()
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<Value>,
}

/// Best human-readable message in an error response body.
///
/// Prefers a JSON `message`, then a JSON `error`, then the raw text.
pub fn error_message_from_body(body: &str) -> Option<String> {
    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            message: Some(message),
            ..
        }) => message,
        Ok(ErrorBody {
            error: Some(Value::String(error)),
            ..
        }) => error,
        Ok(ErrorBody {
            error: Some(error), ..
        }) => error.to_string(),
        _ => body.to_string(),
    };

    let compacted = compact_text(&message);
    (!compacted.is_empty()).then_some(compacted)
}

/// Current Unix timestamp in milliseconds.
pub fn unix_millis_now() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalize_text_option_trims_and_rejects_empty() {
        assert_eq!(normalize_text_option(None), None);
        assert_eq!(normalize_text_option(Some("   ".to_string())), None);
        assert_eq!(
            normalize_text_option(Some(" Bakery ".to_string())),
            Some("Bakery".to_string())
        );
    }

    #[test]
    fn normalize_http_base_url_requires_scheme() {
        assert_eq!(
            normalize_http_base_url(" https://cashbook.example.com// "),
            Some("https://cashbook.example.com".to_string())
        );
        assert_eq!(
            normalize_http_base_url("http://localhost:3000"),
            Some("http://localhost:3000".to_string())
        );
        assert_eq!(normalize_http_base_url("ftp://example.com"), None);
        assert_eq!(normalize_http_base_url("cashbook.example.com"), None);
        assert_eq!(normalize_http_base_url(""), None);
    }

    #[test]
    fn error_message_from_body_prefers_json_fields() {
        assert_eq!(
            error_message_from_body(r#"{"message":"slow down","error":"rate_limited"}"#),
            Some("slow down".to_string())
        );
        assert_eq!(
            error_message_from_body(r#"{"error":"No organization found"}"#),
            Some("No organization found".to_string())
        );
        assert_eq!(
            error_message_from_body(r#"{"error":{"code":42}}"#),
            Some(r#"{"code":42}"#.to_string())
        );
        assert_eq!(
            error_message_from_body("  upstream timeout "),
            Some("upstream timeout".to_string())
        );
        assert_eq!(error_message_from_body("   "), None);
    }

    #[test]
    fn compact_text_truncates_long_bodies() {
        let long = "x".repeat(500);
        assert_eq!(compact_text(&long).len(), MAX_MESSAGE_CHARS);
        assert_eq!(compact_text("  short  "), "short");
    }
}
