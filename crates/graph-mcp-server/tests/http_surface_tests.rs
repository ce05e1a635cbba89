//! Integration tests for the unified `/api/mcp` endpoint and both legacy transports, driven
//! straight through the axum [`Router`] with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures::StreamExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use graph_mcp_server::config::Config;
use graph_mcp_server::server::McpServer;
use graph_mcp_server::storage::memory::InMemoryStorage;
use graph_mcp_server::storage::StorageClient;

const AUTH: &str = "Bearer test-token";

fn build_router() -> axum::Router {
    let storage: Arc<dyn StorageClient> = Arc::new(InMemoryStorage::new());
    let server = McpServer::new(storage, Config::for_testing());
    server.into_router()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn initialize_request() -> Request<Body> {
    Request::post("/api/mcp")
        .header("Content-Type", "application/json")
        .header("Accept", "application/json")
        .header("Authorization", AUTH)
        .body(Body::from(
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "initialize",
                "params": {
                    "protocolVersion": "2025-06-18",
                    "clientInfo": { "name": "test-client", "version": "1.0" }
                }
            })
            .to_string(),
        ))
        .unwrap()
}

#[tokio::test]
async fn initialize_then_tools_list_round_trips() {
    let app = build_router();

    let response = app.clone().oneshot(initialize_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let session_id = response.headers().get("Mcp-Session-Id").unwrap().to_str().unwrap().to_string();
    let body = body_json(response).await;
    assert_eq!(body["result"]["protocolVersion"], "2025-06-18");

    let response = app
        .oneshot(
            Request::post("/api/mcp")
                .header("Content-Type", "application/json")
                .header("Accept", "application/json")
                .header("Authorization", AUTH)
                .header("Mcp-Session-Id", session_id)
                .body(Body::from(json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let tools = body["result"]["tools"].as_array().unwrap();
    assert!(tools.iter().any(|t| t["name"] == "create_entity"));
}

#[tokio::test]
async fn tools_list_before_initialize_is_rejected() {
    let app = build_router();

    let response = app
        .oneshot(
            Request::post("/api/mcp")
                .header("Content-Type", "application/json")
                .header("Accept", "application/json")
                .header("Authorization", AUTH)
                .body(Body::from(json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], -32600);
}

#[tokio::test]
async fn missing_credentials_are_rejected_with_401() {
    let app = build_router();

    let response = app
        .oneshot(
            Request::post("/api/mcp")
                .header("Content-Type", "application/json")
                .header("Accept", "application/json")
                .body(Body::from(json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unsupported_protocol_version_is_rejected() {
    let app = build_router();

    let response = app
        .oneshot(
            Request::post("/api/mcp")
                .header("Content-Type", "application/json")
                .header("Accept", "application/json")
                .header("Authorization", AUTH)
                .body(Body::from(
                    json!({
                        "jsonrpc": "2.0",
                        "id": 1,
                        "method": "initialize",
                        "params": {
                            "protocolVersion": "1999-01-01",
                            "clientInfo": { "name": "test-client" }
                        }
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], -32602);
}

#[tokio::test]
async fn unsupported_protocol_version_header_is_rejected() {
    let app = build_router();

    let response = app
        .oneshot(
            Request::post("/api/mcp")
                .header("Content-Type", "application/json")
                .header("Accept", "application/json")
                .header("Authorization", AUTH)
                .header("MCP-Protocol-Version", "1999-01-01")
                .body(Body::from(json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn absent_protocol_version_header_falls_back_to_the_default() {
    let app = build_router();

    let response = app.oneshot(initialize_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn legacy_rpc_rejects_an_unsupported_protocol_version_header() {
    let app = build_router();

    let response = app
        .oneshot(
            Request::post("/api/mcp/rpc")
                .header("Content-Type", "application/json")
                .header("Authorization", AUTH)
                .header("MCP-Protocol-Version", "1999-01-01")
                .body(Body::from(json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn legacy_rpc_rejects_a_non_2_0_jsonrpc_version() {
    let app = build_router();

    let response = app
        .oneshot(
            Request::post("/api/mcp/rpc")
                .header("Content-Type", "application/json")
                .header("Authorization", AUTH)
                .body(Body::from(json!({ "jsonrpc": "1.0", "id": 1, "method": "initialize" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], -32600);
}

#[tokio::test]
async fn session_terminate_then_get_is_404() {
    let app = build_router();

    let response = app.clone().oneshot(initialize_request()).await.unwrap();
    let session_id = response.headers().get("Mcp-Session-Id").unwrap().to_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(Request::delete("/api/mcp").header("Mcp-Session-Id", session_id.clone()).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(
            Request::get("/api/mcp")
                .header("Accept", "text/event-stream")
                .header("Mcp-Session-Id", session_id)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unified_get_streams_a_priming_event() {
    let app = build_router();

    let response = app.clone().oneshot(initialize_request()).await.unwrap();
    let session_id = response.headers().get("Mcp-Session-Id").unwrap().to_str().unwrap().to_string();

    let response = app
        .oneshot(
            Request::get("/api/mcp")
                .header("Accept", "text/event-stream")
                .header("Mcp-Session-Id", session_id)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "text/event-stream");

    let mut stream = response.into_body().into_data_stream();
    let first_chunk = stream.next().await.unwrap().unwrap();
    let text = String::from_utf8(first_chunk.to_vec()).unwrap();
    assert!(text.contains("id:") || text.contains("id: "));
}

#[tokio::test]
async fn legacy_rpc_keys_session_by_bearer_token() {
    let app = build_router();

    let response = app
        .clone()
        .oneshot(
            Request::post("/api/mcp/rpc")
                .header("Content-Type", "application/json")
                .header("Authorization", AUTH)
                .body(Body::from(
                    json!({
                        "jsonrpc": "2.0",
                        "id": 1,
                        "method": "initialize",
                        "params": {
                            "protocolVersion": "2025-06-18",
                            "clientInfo": { "name": "legacy-client" }
                        }
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::post("/api/mcp/rpc")
                .header("Content-Type", "application/json")
                .header("Authorization", AUTH)
                .body(Body::from(json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["result"]["tools"].is_array());
}

#[tokio::test]
async fn legacy_rpc_without_a_prior_initialize_is_rejected() {
    let app = build_router();

    let response = app
        .oneshot(
            Request::post("/api/mcp/rpc")
                .header("Content-Type", "application/json")
                .header("Authorization", "Bearer never-initialized")
                .body(Body::from(json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], -32600);
}

#[tokio::test]
async fn legacy_sse_open_announces_an_endpoint_event() {
    let app = build_router();

    let response = app
        .oneshot(
            Request::get("/api/mcp/sse/11111111-1111-1111-1111-111111111111")
                .header("Authorization", AUTH)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut stream = response.into_body().into_data_stream();
    let first_chunk = stream.next().await.unwrap().unwrap();
    let text = String::from_utf8(first_chunk.to_vec()).unwrap();
    assert!(text.contains("endpoint"));
    assert!(text.contains("/api/mcp/sse/11111111-1111-1111-1111-111111111111/message"));
}
