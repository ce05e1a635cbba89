//! Error types for the MCP gateway.
//!
//! Uses `thiserror` for structured error handling with automatic `From` implementations,
//! plus the fixed JSON-RPC error-code taxonomy the dispatcher echoes back to callers.

use serde::Serialize;

/// Fixed JSON-RPC 2.0 error codes, plus the gateway's custom authz range.
pub mod codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
    pub const UNAUTHORIZED: i32 = -32001;
    pub const FORBIDDEN: i32 = -32002;
    pub const NOT_FOUND: i32 = -32003;
}

/// A JSON-RPC error object, carrying a numeric code, message, and optional structured data.
///
/// This is the error type every dispatcher path returns; the transport layer converts it
/// to either a JSON-RPC error response (HTTP 200) or, for session/transport failures that
/// predate any JSON-RPC parsing, a bare HTTP status.
#[derive(thiserror::Error, Debug, Clone, Serialize)]
#[error("{message} (code {code})")]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcError {
    #[must_use]
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), data: None }
    }

    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(codes::PARSE_ERROR, message)
    }

    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(codes::INVALID_REQUEST, message)
    }

    #[must_use]
    pub fn uninitialized_session() -> Self {
        Self::invalid_request(
            "session is not initialized; call `initialize` before this method",
        )
        .with_data(serde_json::json!({ "hint": "call initialize first" }))
    }

    #[must_use]
    pub fn method_not_found(method: impl Into<String>, supported: &[&str]) -> Self {
        Self::new(codes::METHOD_NOT_FOUND, format!("method not found: {}", method.into()))
            .with_data(serde_json::json!({ "supported_methods": supported }))
    }

    #[must_use]
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(codes::INVALID_PARAMS, message)
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(codes::INTERNAL_ERROR, message)
    }

    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(codes::UNAUTHORIZED, message)
    }

    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(codes::FORBIDDEN, message)
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(codes::NOT_FOUND, message)
    }
}

/// Errors raised while a tool handler runs, before they are folded into an `RpcError`
/// (code -32603) or reported in-band via `ToolResult { is_error: true, .. }`.
#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    /// Input validation failed before any storage call was made.
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// The underlying storage collaborator returned an error.
    #[error("storage error: {0}")]
    Storage(String),

    /// JSON encoding/decoding of a handler's arguments or result failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal invariant violation (not a caller mistake).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ToolError {
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation { field: field.into(), message: message.into() }
    }

    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl From<ToolError> for RpcError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::Validation { field, message } => {
                RpcError::invalid_params(format!("invalid {field}: {message}"))
            }
            other => RpcError::internal(other.to_string()),
        }
    }
}

pub type ToolOutcome<T> = Result<T, ToolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uninitialized_session_hints_at_initialize() {
        let err = RpcError::uninitialized_session();
        assert_eq!(err.code, codes::INVALID_REQUEST);
        assert!(err.message.contains("initialize"));
    }

    #[test]
    fn validation_error_maps_to_invalid_params() {
        let tool_err = ToolError::validation("entity_id", "malformed uuid");
        let rpc_err: RpcError = tool_err.into();
        assert_eq!(rpc_err.code, codes::INVALID_PARAMS);
        assert!(rpc_err.message.contains("entity_id"));
    }

    #[test]
    fn storage_error_maps_to_internal() {
        let tool_err = ToolError::storage("connection reset");
        let rpc_err: RpcError = tool_err.into();
        assert_eq!(rpc_err.code, codes::INTERNAL_ERROR);
    }
}
