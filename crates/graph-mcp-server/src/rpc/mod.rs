//! JSON-RPC 2.0 envelope codec.
//!
//! Parses incoming request bodies into [`JsonRpcRequest`], classifies notifications, and
//! builds success/error responses that always echo the caller's `id` verbatim.

use serde::{Deserialize, Serialize};

use crate::error::RpcError;

/// JSON-RPC 2.0 request envelope.
///
/// `id` is `None` only when the field is absent from the wire; a present-but-`null` id
/// deserializes to `Some(Value::Null)`. Serde's blanket `Option<T>` support would normally
/// collapse both cases to `None` (`deserialize_option` treats the JSON `null` token as Rust's
/// `None` before `T` is ever consulted), so `id` is deserialized through [`deserialize_id`]
/// instead, which deserializes straight into `Value` and only wraps the *field* in `Some` when
/// it was present at all. [`JsonRpcRequest::is_notification`] treats only the absent case as
/// a notification.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(default, deserialize_with = "deserialize_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
}

/// Deserializes a present `id` field (literal `null` included) into `Some(value)`. Paired with
/// `#[serde(default)]`, an absent field still falls back to `None`.
fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

impl JsonRpcRequest {
    /// A request is a notification iff `id` is absent. A literal `id: null` is a request
    /// with id null, not a notification.
    #[must_use]
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// True for a frame with neither `id` nor `method` — a response-shaped frame the
    /// server should acknowledge without dispatching.
    #[must_use]
    pub fn is_response_only(&self) -> bool {
        self.id.is_none() && self.method.is_empty()
    }

    #[must_use]
    pub fn is_valid_version(&self) -> bool {
        self.jsonrpc == "2.0"
    }

    /// Parse a raw request body. On failure, returns a parse-error response (code -32700)
    /// with no echoed id, because the offending body could not be parsed far enough to
    /// recover one.
    pub fn parse(body: &[u8]) -> Result<Self, RpcError> {
        serde_json::from_slice(body).map_err(|e| RpcError::parse(format!("parse error: {e}")))
    }
}

/// JSON-RPC 2.0 response envelope: exactly one of `result`/`error` is populated.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: Option<serde_json::Value>,
}

impl JsonRpcResponse {
    const VERSION: &'static str = "2.0";

    #[must_use]
    pub fn success(id: Option<serde_json::Value>, result: serde_json::Value) -> Self {
        Self { jsonrpc: Self::VERSION, result: Some(result), error: None, id }
    }

    #[must_use]
    pub fn error(id: Option<serde_json::Value>, error: RpcError) -> Self {
        Self { jsonrpc: Self::VERSION, result: None, error: Some(error), id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_id_is_a_notification() {
        let req: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
                .unwrap();
        assert!(req.is_notification());
    }

    #[test]
    fn literal_null_id_is_not_a_notification() {
        let req: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"tools/list","id":null}"#).unwrap();
        assert!(!req.is_notification());
        assert_eq!(req.id, Some(serde_json::Value::Null));
    }

    #[test]
    fn jsonrpc_mismatch_is_not_flagged_by_parse_alone() {
        // Parsing succeeds; the dispatcher is responsible for rejecting `jsonrpc != "2.0"`
        // with code -32600 and HTTP 200.
        let req: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"1.0","method":"ping","id":1}"#).unwrap();
        assert!(!req.is_valid_version());
    }

    #[test]
    fn malformed_body_yields_parse_error() {
        let err = JsonRpcRequest::parse(b"{not json").unwrap_err();
        assert_eq!(err.code, crate::error::codes::PARSE_ERROR);
    }

    #[test]
    fn response_only_frame_is_detected() {
        let req: JsonRpcRequest = serde_json::from_str(r#"{"jsonrpc":"2.0","result":{}}"#).unwrap();
        assert!(req.is_response_only());
    }
}
