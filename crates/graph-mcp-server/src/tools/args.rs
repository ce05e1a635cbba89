//! Argument coercion from loosely typed JSON.
//!
//! Every handler runs its `arguments` object through these helpers instead of hand-rolling
//! `serde_json::Value` matching. Numeric arguments are clamped rather than rejected; strings
//! are required-or-absent; arrays coerce element-by-element, skipping malformed elements.

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::ToolError;

/// A required, non-empty string field. Missing, non-string, or empty fails invalid-params.
pub fn require_string(args: &Map<String, Value>, field: &str) -> Result<String, ToolError> {
    match args.get(field).and_then(Value::as_str) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(ToolError::validation(field, "required and must be a non-empty string")),
    }
}

/// An optional string field. Absent or empty is treated as `None`, matching the "treated as
/// absent for optional" rule.
#[must_use]
pub fn optional_string(args: &Map<String, Value>, field: &str) -> Option<String> {
    args.get(field).and_then(Value::as_str).filter(|s| !s.is_empty()).map(str::to_string)
}

/// A required UUID-shaped string field.
pub fn require_uuid(args: &Map<String, Value>, field: &str) -> Result<Uuid, ToolError> {
    let raw = require_string(args, field)?;
    Uuid::parse_str(&raw).map_err(|_| ToolError::validation(field, "malformed uuid"))
}

/// An optional UUID-shaped string field; a present-but-malformed value is still an error.
pub fn optional_uuid(args: &Map<String, Value>, field: &str) -> Result<Option<Uuid>, ToolError> {
    match args.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => {
            let raw = v.as_str().filter(|s| !s.is_empty());
            match raw {
                None => Ok(None),
                Some(s) => Uuid::parse_str(s)
                    .map(Some)
                    .map_err(|_| ToolError::validation(field, "malformed uuid")),
            }
        }
    }
}

/// A vector of UUID-shaped strings; malformed elements are skipped rather than failing
/// the whole request.
#[must_use]
pub fn coerce_uuid_array(args: &Map<String, Value>, field: &str) -> Vec<Uuid> {
    args.get(field)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(|v| v.as_str().and_then(|s| Uuid::parse_str(s).ok())).collect())
        .unwrap_or_default()
}

/// A vector of strings; non-string elements are skipped.
#[must_use]
pub fn coerce_string_array(args: &Map<String, Value>, field: &str) -> Vec<String> {
    args.get(field)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

/// A clamped integer in `[min, max]`, applying `default` when absent and truncating
/// out-of-range floats before clamping.
#[must_use]
pub fn clamp_i64(args: &Map<String, Value>, field: &str, min: i64, max: i64, default: i64) -> i64 {
    let raw = args.get(field).and_then(Value::as_i64).or_else(|| args.get(field).and_then(Value::as_f64).map(|f| f as i64));
    raw.unwrap_or(default).clamp(min, max)
}

/// A pagination offset: negative values are raised to zero, never clamped upward.
#[must_use]
pub fn offset_or_zero(args: &Map<String, Value>, field: &str) -> i64 {
    args.get(field).and_then(Value::as_i64).unwrap_or(0).max(0)
}

/// Entries of a JSON object argument, skipping the value if it is not an object at all.
#[must_use]
pub fn object_or_empty(args: &Map<String, Value>, field: &str) -> Map<String, Value> {
    args.get(field).and_then(Value::as_object).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn require_string_rejects_empty() {
        let args = obj(json!({ "name": "" }));
        assert!(require_string(&args, "name").is_err());
    }

    #[test]
    fn clamp_i64_clamps_above_and_below_range() {
        let args = obj(json!({ "limit": 500, "other": -5 }));
        assert_eq!(clamp_i64(&args, "limit", 1, 50, 20), 50);
        assert_eq!(clamp_i64(&args, "other", 1, 50, 20), 1);
        assert_eq!(clamp_i64(&args, "missing", 1, 50, 20), 20);
    }

    #[test]
    fn offset_negative_is_raised_to_zero() {
        let args = obj(json!({ "offset": -10 }));
        assert_eq!(offset_or_zero(&args, "offset"), 0);
    }

    #[test]
    fn malformed_uuid_array_elements_are_skipped() {
        let args = obj(json!({ "ids": ["not-a-uuid", "11111111-1111-1111-1111-111111111111"] }));
        let ids = coerce_uuid_array(&args, "ids");
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn malformed_required_uuid_is_rejected() {
        let args = obj(json!({ "entity_id": "nope" }));
        assert!(require_uuid(&args, "entity_id").is_err());
    }

    proptest! {
        /// Whatever range `[min, max]` a caller asks for, the clamped value stays inside it.
        #[test]
        fn clamp_i64_always_lands_in_range(value: i64, min in 0i64..100, span in 0i64..1000) {
            let max = min + span;
            let args = obj(json!({ "n": value }));
            let clamped = clamp_i64(&args, "n", min, max, min);
            prop_assert!(clamped >= min && clamped <= max);
        }

        /// Any `offset` input, however negative, comes back non-negative.
        #[test]
        fn offset_or_zero_never_goes_negative(value: i64) {
            let args = obj(json!({ "offset": value }));
            prop_assert!(offset_or_zero(&args, "offset") >= 0);
        }
    }
}
