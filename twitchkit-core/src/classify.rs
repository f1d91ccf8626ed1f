//! Maps failed responses to [`ErrorEnvelope`]s.
//!
//! Pure lookups only; retry decisions live in the dispatcher.

use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::{ErrorEnvelope, ErrorKind};

/// Statuses with a dedicated kind. Everything else is `RemoteService`.
const STATUS_KINDS: [(u16, ErrorKind); 4] = [
    (400, ErrorKind::BadRequest),
    (401, ErrorKind::Unauthorized),
    (403, ErrorKind::Forbidden),
    (429, ErrorKind::TooManyRequests),
];

/// Helix error bodies look like
/// `{"error": "Unauthorized", "status": 401, "message": "Invalid OAuth token"}`.
#[derive(Debug, Deserialize)]
struct HelixErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

pub fn kind_for_status(status: u16) -> ErrorKind {
    STATUS_KINDS
        .iter()
        .find(|(code, _)| *code == status)
        .map(|(_, kind)| *kind)
        .unwrap_or(ErrorKind::RemoteService)
}

/// Human-readable message for a failed response.
///
/// Prefers the `message` field of a Helix error body, then `error`, then the
/// raw body text, then the canonical reason phrase.
pub fn error_message(status: u16, body: &[u8]) -> String {
    if let Ok(parsed) = serde_json::from_slice::<HelixErrorBody>(body) {
        if let Some(message) = parsed.message.filter(|m| !m.trim().is_empty()) {
            return message;
        }
        if let Some(error) = parsed.error.filter(|e| !e.trim().is_empty()) {
            return error;
        }
    }

    let text = String::from_utf8_lossy(body).trim().to_string();
    if !text.is_empty() {
        return text;
    }

    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("unknown status")
        .to_string()
}

pub fn classify(status: u16, body: &[u8]) -> ErrorEnvelope {
    ErrorEnvelope {
        status,
        message: error_message(status, body),
        kind: kind_for_status(status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_table_statuses() {
        assert_eq!(kind_for_status(400), ErrorKind::BadRequest);
        assert_eq!(kind_for_status(401), ErrorKind::Unauthorized);
        assert_eq!(kind_for_status(403), ErrorKind::Forbidden);
        assert_eq!(kind_for_status(429), ErrorKind::TooManyRequests);
    }

    #[test]
    fn unlisted_statuses_are_remote_service() {
        for status in [404, 409, 422, 500, 502, 503] {
            assert_eq!(kind_for_status(status), ErrorKind::RemoteService, "{status}");
        }
    }

    #[test]
    fn uses_helix_message_field() {
        let body = br#"{"error":"Unauthorized","status":401,"message":"Invalid OAuth token"}"#;
        let envelope = classify(401, body);
        assert_eq!(envelope.status, 401);
        assert_eq!(envelope.message, "Invalid OAuth token");
        assert_eq!(envelope.kind, ErrorKind::Unauthorized);
    }

    #[test]
    fn falls_back_to_error_field() {
        let body = br#"{"error":"Too Many Requests","status":429,"message":""}"#;
        assert_eq!(error_message(429, body), "Too Many Requests");
    }

    #[test]
    fn falls_back_to_raw_text_then_reason() {
        assert_eq!(error_message(502, b"upstream down"), "upstream down");
        assert_eq!(error_message(403, b""), "Forbidden");
    }
}
