//! Mapping of backend responses into [`RemoteError`]
//!
//! This is the only place that looks at status codes or message text.

use serde::Deserialize;
use serde_json::Value;

use crate::shared::errors::{RemoteError, RemoteErrorKind};

/// Phrases the backend uses when a reading already has a bill
const DUPLICATE_MARKERS: [&str; 3] = ["duplicate", "already billed", "already exists"];

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    detail: Option<Value>,
}

/// Classify a non-2xx response.
pub fn classify_response(status: u16, body: &str) -> RemoteError {
    let message = extract_message(body).unwrap_or_else(|| format!("HTTP {}", status));

    let kind = match status {
        409 => RemoteErrorKind::Conflict,
        400 | 404 | 422 if mentions_duplicate(&message) => RemoteErrorKind::Conflict,
        400 | 404 | 422 => RemoteErrorKind::Validation,
        408 => RemoteErrorKind::Network,
        429 | 500..=599 => RemoteErrorKind::Server,
        _ => RemoteErrorKind::Unknown,
    };

    RemoteError::new(kind, message).with_status(status)
}

/// Classify a failure that produced no usable response.
pub fn classify_transport(err: &reqwest::Error) -> RemoteError {
    let kind = if err.is_decode() {
        RemoteErrorKind::Unknown
    } else {
        RemoteErrorKind::Network
    };
    let error = RemoteError::new(kind, err.to_string());
    match err.status() {
        Some(status) => error.with_status(status.as_u16()),
        None => error,
    }
}

fn mentions_duplicate(message: &str) -> bool {
    let lower = message.to_lowercase();
    DUPLICATE_MARKERS.iter().any(|m| lower.contains(m))
}

fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<ErrorBody>(trimmed) {
        Ok(parsed) => [parsed.message, parsed.error, parsed.detail]
            .into_iter()
            .flatten()
            .find_map(value_text)
            .or_else(|| Some(trimmed.to_string())),
        Err(_) => Some(trimmed.to_string()),
    }
}

/// Text out of a message field; validation errors often come as
/// `{"field": ["msg", ...]}` or a list of messages.
fn value_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Array(items) => {
            let parts: Vec<String> = items.into_iter().filter_map(value_text).collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        Value::Object(map) => {
            if let Some(inner) = map.get("message").cloned().and_then(value_text) {
                return Some(inner);
            }
            let parts: Vec<String> = map
                .into_iter()
                .filter_map(|(field, v)| value_text(v).map(|t| format!("{}: {}", field, t)))
                .collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_status_is_conflict() {
        let err = classify_response(409, r#"{"message": "duplicate reading"}"#);
        assert_eq!(err.kind, RemoteErrorKind::Conflict);
        assert_eq!(err.message, "duplicate reading");
        assert_eq!(err.status, Some(409));
    }

    #[test]
    fn duplicate_wording_on_bad_request_is_conflict() {
        let err = classify_response(400, r#"{"error": "Reading already billed"}"#);
        assert_eq!(err.kind, RemoteErrorKind::Conflict);
    }

    #[test]
    fn unprocessable_is_validation() {
        let err = classify_response(422, r#"{"message": "invalid rate"}"#);
        assert_eq!(err.kind, RemoteErrorKind::Validation);
        assert_eq!(err.message, "invalid rate");
    }

    #[test]
    fn field_errors_are_flattened() {
        let err = classify_response(400, r#"{"error": {"rate_id": ["invalid rate"]}}"#);
        assert_eq!(err.kind, RemoteErrorKind::Validation);
        assert_eq!(err.message, "rate_id: invalid rate");
    }

    #[test]
    fn server_errors_and_throttling_are_server() {
        assert_eq!(classify_response(500, "oops").kind, RemoteErrorKind::Server);
        assert_eq!(classify_response(503, "").kind, RemoteErrorKind::Server);
        assert_eq!(classify_response(429, "").kind, RemoteErrorKind::Server);
    }

    #[test]
    fn plain_text_and_empty_bodies() {
        assert_eq!(classify_response(500, "  gateway down \n").message, "gateway down");
        assert_eq!(classify_response(502, "").message, "HTTP 502");
    }

    #[test]
    fn unexpected_statuses_are_unknown() {
        assert_eq!(classify_response(401, "").kind, RemoteErrorKind::Unknown);
        assert_eq!(classify_response(302, "").kind, RemoteErrorKind::Unknown);
        assert_eq!(classify_response(408, "").kind, RemoteErrorKind::Network);
    }
}
