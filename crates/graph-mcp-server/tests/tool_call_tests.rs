//! Integration tests for `tools/call` dispatch through the unified endpoint: project-id
//! resolution, batch partial failure, and in-band tool errors.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use graph_mcp_server::config::Config;
use graph_mcp_server::server::McpServer;
use graph_mcp_server::storage::memory::InMemoryStorage;
use graph_mcp_server::storage::StorageClient;

const PROJECT_ID: &str = "22222222-2222-2222-2222-222222222222";

/// A single initialized MCP session, driven straight through the router.
struct Client {
    app: axum::Router,
    session_id: Option<String>,
}

impl Client {
    fn new() -> Self {
        let storage: Arc<dyn StorageClient> = Arc::new(InMemoryStorage::new());
        let app = McpServer::new(storage, Config::for_testing()).into_router();
        Self { app, session_id: None }
    }

    async fn initialize(&mut self, params: Value) -> Value {
        let mut request = Request::post("/api/mcp")
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .header("Authorization", "Bearer t");
        if let Some(id) = &self.session_id {
            request = request.header("Mcp-Session-Id", id);
        }
        let response = self
            .app
            .clone()
            .oneshot(request.body(Body::from(json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize", "params": params }).to_string())).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        if let Some(id) = response.headers().get("Mcp-Session-Id") {
            self.session_id = Some(id.to_str().unwrap().to_string());
        }
        body_json(response).await
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Value {
        self.rpc("tools/call", json!({ "name": name, "arguments": arguments })).await
    }

    async fn rpc(&self, method: &str, params: Value) -> Value {
        let mut request = Request::post("/api/mcp")
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .header("Authorization", "Bearer t");
        if let Some(id) = &self.session_id {
            request = request.header("Mcp-Session-Id", id);
        }
        let response = self
            .app
            .clone()
            .oneshot(request.body(Body::from(json!({ "jsonrpc": "2.0", "id": 2, "method": method, "params": params }).to_string())).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn initialized_client() -> Client {
    let mut client = Client::new();
    let body = client
        .initialize(json!({ "protocolVersion": "2025-06-18", "clientInfo": { "name": "test" }, "project_id": PROJECT_ID }))
        .await;
    assert!(body["error"].is_null(), "initialize failed: {body:?}");
    client
}

fn tool_result(body: &Value) -> Value {
    let text = body["result"]["content"][0]["text"].as_str().expect("tool result text");
    serde_json::from_str(text).expect("tool result is JSON")
}

#[tokio::test]
async fn batch_create_entities_reports_partial_failure() {
    let client = initialized_client().await;

    let body = client
        .call_tool(
            "batch_create_entities",
            json!({
                "entities": [
                    { "type": "Person", "properties": { "name": "Ada" } },
                    { "properties": { "name": "missing a type" } },
                    { "type": "Person", "properties": { "name": "Grace" } }
                ]
            }),
        )
        .await;

    let result = tool_result(&body);
    assert_eq!(result["success"], 2);
    assert_eq!(result["failed"], 1);
    assert_eq!(result["total"], 3);
    let results = result["results"].as_array().unwrap();
    assert_eq!(results[1]["success"], false);
    assert!(results[1]["error"].as_str().unwrap().contains("type"));
}

#[tokio::test]
async fn batch_create_entities_rejects_an_oversized_batch() {
    let client = initialized_client().await;

    let entities: Vec<Value> = (0..150).map(|i| json!({ "type": "Thing", "properties": { "n": i } })).collect();
    let body = client.call_tool("batch_create_entities", json!({ "entities": entities })).await;

    assert_eq!(body["error"]["code"], -32602);
}

#[tokio::test]
async fn schema_version_tool_returns_a_fingerprint() {
    let client = initialized_client().await;

    let body = client.call_tool("schema_version", json!({})).await;
    let result = tool_result(&body);
    assert!(result["fingerprint"].as_str().is_some());
    assert!(result["cache_ttl_seconds"].as_u64().is_some());
}

#[tokio::test]
async fn create_entity_without_a_project_id_is_rejected() {
    let mut client = Client::new();
    let body = client.initialize(json!({ "protocolVersion": "2025-06-18", "clientInfo": { "name": "test" } })).await;
    assert!(body["error"].is_null());

    let body = client.call_tool("create_entity", json!({ "type": "Person", "properties": {} })).await;
    assert_eq!(body["error"]["code"], -32602);
}

#[tokio::test]
async fn created_entity_shows_up_in_the_recent_entities_resource() {
    let client = initialized_client().await;

    let body = client.call_tool("create_entity", json!({ "type": "Person", "properties": { "name": "Ada" } })).await;
    assert!(body["error"].is_null(), "create_entity failed: {body:?}");

    let body = client
        .rpc("resources/read", json!({ "uri": format!("emergent://projects/{PROJECT_ID}/recent-entities") }))
        .await;
    assert!(body["error"].is_null(), "resources/read failed: {body:?}");
    let contents = &body["result"];
    let text = contents["text"].as_str().expect("resource contents has text");
    let entities: Value = serde_json::from_str(text).unwrap();
    assert!(entities.as_array().unwrap().iter().any(|e| e["properties"]["name"] == "Ada"));
}
