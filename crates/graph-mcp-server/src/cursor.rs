//! Opaque pagination cursors.
//!
//! A cursor is the base64 URL-safe (no padding) encoding of a small JSON object
//! `{"createdAt": <RFC3339>, "id": <string>}`. It lets a list operation hand a caller an
//! opaque continuation token instead of a raw offset, so pages stay stable while rows are
//! inserted ahead of the cursor position.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    pub id: String,
}

/// Encode a cursor to its opaque base64 URL-safe form.
#[must_use]
pub fn encode_cursor(cursor: &Cursor) -> String {
    let json = serde_json::to_vec(cursor).expect("Cursor serializes infallibly");
    URL_SAFE_NO_PAD.encode(json)
}

/// Decode an opaque cursor string.
///
/// An empty string yields `Ok(None)` — the first page has no predecessor cursor, and callers
/// should not have to special-case that against a malformed one. Anything else that fails to
/// decode as base64 or parse as a `Cursor` is an error.
pub fn parse_cursor(raw: &str) -> Result<Option<Cursor>, String> {
    if raw.is_empty() {
        return Ok(None);
    }
    let bytes = URL_SAFE_NO_PAD.decode(raw).map_err(|e| format!("invalid cursor encoding: {e}"))?;
    let cursor: Cursor = serde_json::from_slice(&bytes).map_err(|e| format!("invalid cursor payload: {e}"))?;
    Ok(Some(cursor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Cursor {
        Cursor { created_at: Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(), id: "doc-123".to_string() }
    }

    #[test]
    fn round_trips_through_encode_and_parse() {
        let cursor = sample();
        let encoded = encode_cursor(&cursor);
        assert_eq!(parse_cursor(&encoded).unwrap(), Some(cursor));
    }

    #[test]
    fn empty_string_is_absent_not_an_error() {
        assert_eq!(parse_cursor("").unwrap(), None);
    }

    #[test]
    fn decodes_the_literal_fixture_from_the_testable_properties() {
        let raw = "eyJjcmVhdGVkQXQiOiIyMDI0LTAxLTE1VDEwOjMwOjAwWiIsImlkIjoiZG9jLTEyMyJ9";
        let cursor = parse_cursor(raw).unwrap().unwrap();
        assert_eq!(cursor, sample());
        assert_eq!(encode_cursor(&cursor), raw);
    }

    #[test]
    fn malformed_base64_is_an_error() {
        assert!(parse_cursor("not-valid-base64!!!").is_err());
    }
}
