//! JSON-RPC method router.
//!
//! Binds `initialize`, `tools/list`, `tools/call`, `notifications/initialized`,
//! `resources/list`, `resources/read`, `prompts/list`, `prompts/get` to their handlers, and
//! falls back to method-not-found for everything else.

use std::sync::Arc;

use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::AuthenticatedCaller;
use crate::config::{Config, PROJECT_REQUIRED_TOOLS};
use crate::error::RpcError;
use crate::resources;
use crate::prompts;
use crate::rpc::{JsonRpcRequest, JsonRpcResponse};
use crate::schema_version::SchemaVersionCache;
use crate::session::Session;
use crate::storage::StorageClient;
use crate::tools::{ToolContext, ToolRegistry};

pub const SUPPORTED_METHODS: &[&str] = &[
    "initialize",
    "notifications/initialized",
    "tools/list",
    "tools/call",
    "resources/list",
    "resources/read",
    "prompts/list",
    "prompts/get",
];

/// Wires together the tool registry, storage collaborator, and schema-version cache needed
/// to route every supported JSON-RPC method.
pub struct Dispatcher {
    pub tools: Arc<ToolRegistry>,
    pub storage: Arc<dyn StorageClient>,
    pub schema_version: Arc<SchemaVersionCache>,
    pub config: Arc<Config>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        tools: Arc<ToolRegistry>,
        storage: Arc<dyn StorageClient>,
        schema_version: Arc<SchemaVersionCache>,
        config: Arc<Config>,
    ) -> Self {
        Self { tools, storage, schema_version, config }
    }

    /// Route a notification (no response expected). Presently only
    /// `notifications/initialized` does anything; everything else is ignored.
    pub async fn dispatch_notification(&self, session: &Arc<Session>, request: &JsonRpcRequest) {
        if request.method == "notifications/initialized" {
            // Sticky post-condition of either `initialize` or this notification.
            let protocol_version = session.protocol_version.read().await.clone();
            let default_project_id = *session.default_project_id.read().await;
            session
                .mark_initialized(
                    protocol_version.unwrap_or_else(|| self.config.supported_protocol_versions[0].clone()),
                    default_project_id,
                )
                .await;
        }
    }

    /// Route a call (request carrying an id) and build the JSON-RPC response.
    pub async fn dispatch_call(
        &self,
        session: &Arc<Session>,
        caller: &AuthenticatedCaller,
        request: JsonRpcRequest,
    ) -> JsonRpcResponse {
        let id = request.id.clone();
        let result = self.route(session, caller, &request).await;
        match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(err) => JsonRpcResponse::error(id, err),
        }
    }

    async fn route(
        &self,
        session: &Arc<Session>,
        caller: &AuthenticatedCaller,
        request: &JsonRpcRequest,
    ) -> Result<Value, RpcError> {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(session, caller, &request.params).await,
            "tools/list" => {
                self.require_initialized(session).await?;
                Ok(json!({ "tools": self.tools.catalog() }))
            }
            "tools/call" => self.handle_tools_call(session, caller, &request.params).await,
            "resources/list" => {
                self.require_initialized(session).await?;
                Ok(json!({ "resources": resources::catalog() }))
            }
            "resources/read" => self.handle_resources_read(session, caller, &request.params).await,
            "prompts/list" => {
                self.require_initialized(session).await?;
                Ok(json!({ "prompts": prompts::catalog() }))
            }
            "prompts/get" => self.handle_prompts_get(session, &request.params).await,
            other => Err(RpcError::method_not_found(other, SUPPORTED_METHODS)),
        }
    }

    async fn require_initialized(&self, session: &Arc<Session>) -> Result<(), RpcError> {
        if session.is_initialized().await {
            Ok(())
        } else {
            Err(RpcError::uninitialized_session())
        }
    }

    async fn handle_initialize(
        &self,
        session: &Arc<Session>,
        caller: &AuthenticatedCaller,
        params: &Value,
    ) -> Result<Value, RpcError> {
        let protocol_version =
            params.get("protocolVersion").and_then(Value::as_str).unwrap_or(&self.config.supported_protocol_versions[0]);
        if !self.config.supports_protocol_version(protocol_version) {
            return Err(RpcError::invalid_params(format!("unsupported protocolVersion: {protocol_version}"))
                .with_data(json!({ "supported": self.config.supported_protocol_versions })));
        }

        let client_name = params.get("clientInfo").and_then(|c| c.get("name")).and_then(Value::as_str);
        if client_name.is_none_or(str::is_empty) {
            return Err(RpcError::invalid_params("clientInfo.name is required and must be non-empty"));
        }

        let project_id = params
            .get("project_id")
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
            .or(caller.project_id);

        session.mark_initialized(protocol_version.to_string(), project_id).await;

        let mut result = json!({
            "protocolVersion": protocol_version,
            "capabilities": {
                "tools": { "listChanged": false },
                "resources": { "listChanged": false },
                "prompts": { "listChanged": false }
            },
            "serverInfo": { "name": "graph-mcp-server", "version": env!("CARGO_PKG_VERSION") }
        });
        if let Some(project_id) = project_id {
            result["projectContext"] = json!({ "project_id": project_id });
        }
        Ok(result)
    }

    async fn handle_tools_call(
        &self,
        session: &Arc<Session>,
        caller: &AuthenticatedCaller,
        params: &Value,
    ) -> Result<Value, RpcError> {
        self.require_initialized(session).await?;

        let name = params
            .get("name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| RpcError::invalid_params("tool call requires a non-empty `name`"))?;
        let arguments = params.get("arguments").and_then(Value::as_object).cloned().unwrap_or_default();

        let effective_project_id = session.default_project_id.read().await.or(caller.project_id);
        if PROJECT_REQUIRED_TOOLS.contains(&name) && effective_project_id.is_none() {
            return Err(RpcError::invalid_params(format!(
                "tool `{name}` requires a project id; bind one at initialize or on the caller"
            ))
            .with_data(json!({ "hint": "pass project_id to initialize, or use a project-bound API key" })));
        }

        let ctx = ToolContext {
            storage: Arc::clone(&self.storage),
            schema_version: Arc::clone(&self.schema_version),
            project_id: effective_project_id,
            caller: caller.clone(),
        };

        let result = self.tools.dispatch(name, &ctx, &arguments).await?;
        serde_json::to_value(result).map_err(|e| RpcError::internal(format!("failed to encode tool result: {e}")))
    }

    async fn handle_resources_read(
        &self,
        session: &Arc<Session>,
        caller: &AuthenticatedCaller,
        params: &Value,
    ) -> Result<Value, RpcError> {
        self.require_initialized(session).await?;
        let uri = params
            .get("uri")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::invalid_params("resources/read requires `uri`"))?;
        let effective_project_id = session.default_project_id.read().await.or(caller.project_id);
        let contents = resources::read(&self.storage, uri, effective_project_id).await?;
        serde_json::to_value(contents).map_err(|e| RpcError::internal(format!("failed to encode resource: {e}")))
    }

    async fn handle_prompts_get(&self, session: &Arc<Session>, params: &Value) -> Result<Value, RpcError> {
        self.require_initialized(session).await?;
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::invalid_params("prompts/get requires `name`"))?;
        let arguments = params.get("arguments").and_then(Value::as_object).cloned().unwrap_or_default();
        let result = prompts::get(name, &arguments)?;
        serde_json::to_value(result).map_err(|e| RpcError::internal(format!("failed to encode prompt: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenKind;
    use crate::session::SessionRegistry;
    use crate::storage::memory::InMemoryStorage;
    use std::time::Duration;

    fn test_caller() -> AuthenticatedCaller {
        AuthenticatedCaller {
            user_id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            project_id: Some(Uuid::new_v4()),
            token_kind: TokenKind::Bearer,
        }
    }

    fn test_dispatcher() -> Dispatcher {
        let storage: Arc<dyn StorageClient> = Arc::new(InMemoryStorage::new());
        Dispatcher::new(
            Arc::new(ToolRegistry::new()),
            Arc::clone(&storage),
            Arc::new(SchemaVersionCache::new(storage, Duration::from_secs(60))),
            Arc::new(Config::for_testing()),
        )
    }

    #[tokio::test]
    async fn tools_list_before_initialize_is_rejected() {
        let dispatcher = test_dispatcher();
        let registry = SessionRegistry::new(10);
        let session = registry.allocate().await;
        let caller = test_caller();

        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: "tools/list".to_string(),
            params: Value::Null,
            id: Some(json!(5)),
        };
        let response = dispatcher.dispatch_call(&session, &caller, request).await;
        let error = response.error.unwrap();
        assert_eq!(error.code, crate::error::codes::INVALID_REQUEST);
        assert!(error.message.contains("initialize"));
    }

    #[tokio::test]
    async fn initialize_then_tools_list_succeeds() {
        let dispatcher = test_dispatcher();
        let registry = SessionRegistry::new(10);
        let session = registry.allocate().await;
        let caller = test_caller();

        let init_request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: "initialize".to_string(),
            params: json!({ "protocolVersion": "2025-11-25", "capabilities": {}, "clientInfo": { "name": "t", "version": "1.0" } }),
            id: Some(json!(1)),
        };
        let init_response = dispatcher.dispatch_call(&session, &caller, init_request).await;
        assert!(init_response.error.is_none());
        assert_eq!(init_response.result.unwrap()["protocolVersion"], "2025-11-25");

        let list_request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: "tools/list".to_string(),
            params: Value::Null,
            id: Some(json!(2)),
        };
        let list_response = dispatcher.dispatch_call(&session, &caller, list_request).await;
        let tools = list_response.result.unwrap()["tools"].as_array().unwrap().len();
        assert!(tools > 0);
    }

    #[tokio::test]
    async fn unsupported_protocol_version_is_rejected() {
        let dispatcher = test_dispatcher();
        let registry = SessionRegistry::new(10);
        let session = registry.allocate().await;
        let caller = test_caller();

        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: "initialize".to_string(),
            params: json!({ "protocolVersion": "1999-01-01", "clientInfo": { "name": "t" } }),
            id: Some(json!(1)),
        };
        let response = dispatcher.dispatch_call(&session, &caller, request).await;
        let error = response.error.unwrap();
        assert_eq!(error.code, crate::error::codes::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let dispatcher = test_dispatcher();
        let registry = SessionRegistry::new(10);
        let session = registry.allocate().await;
        let caller = test_caller();

        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: "does/not/exist".to_string(),
            params: Value::Null,
            id: Some(json!(1)),
        };
        let response = dispatcher.dispatch_call(&session, &caller, request).await;
        assert_eq!(response.error.unwrap().code, crate::error::codes::METHOD_NOT_FOUND);
    }
}
