//! Normalization of server error payloads into one human-readable message.
//!
//! The API reports failures as `{"detail": ...}` where `detail` is a plain
//! string, a list of validation errors, or an object. Resolution order:
//!
//! 1. string detail
//! 2. array detail, each entry's text joined with `", "`
//! 3. object detail's `message`, then `msg`
//! 4. any other detail, stringified
//! 5. no detail at all: [`UNEXPECTED_ERROR`]

use serde_json::Value;

/// Message used when the payload carries no detail.
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred";

/// Extract the user-facing message from a raw response body.
pub fn extract_detail_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(json) => message_from_payload(&json),
        Err(_) => UNEXPECTED_ERROR.to_string(),
    }
}

/// Extract the user-facing message from an already parsed payload.
pub fn message_from_payload(payload: &Value) -> String {
    match payload.get("detail") {
        None | Some(Value::Null) => UNEXPECTED_ERROR.to_string(),
        Some(detail) => message_from_detail(detail),
    }
}

fn message_from_detail(detail: &Value) -> String {
    match detail {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(entry_text)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => object_message(detail).unwrap_or_else(|| detail.to_string()),
        other => other.to_string(),
    }
}

fn entry_text(entry: &Value) -> String {
    match entry {
        Value::String(s) => s.clone(),
        Value::Object(_) => object_message(entry).unwrap_or_else(|| entry.to_string()),
        other => other.to_string(),
    }
}

fn object_message(value: &Value) -> Option<String> {
    value
        .get("message")
        .or_else(|| value.get("msg"))
        .and_then(Value::as_str)
        .map(String::from)
}
