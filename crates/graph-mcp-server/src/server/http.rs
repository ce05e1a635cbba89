//! HTTP surface: the unified `/api/mcp` endpoint plus the two legacy transports —
//! session allocation, SSE framing, and the legacy POST/SSE transport pair.
//!
//! Three route groups share one [`AppState`]:
//! - `GET|POST|DELETE /api/mcp` — the spec-compliant unified endpoint.
//! - `POST /api/mcp/rpc` — legacy POST-only JSON-RPC, keyed by the caller's token.
//! - `GET /api/mcp/sse/{project_id}` + `POST /api/mcp/sse/{project_id}/message` — the legacy
//!   project-scoped SSE pair.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_stream::wrappers::BroadcastStream;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::extract_caller;
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::rpc::{JsonRpcRequest, JsonRpcResponse};
use crate::session::{BufferedEvent, Session, SessionRegistry};

pub struct AppState {
    pub sessions: SessionRegistry,
    pub dispatcher: Dispatcher,
    pub config: Arc<Config>,
    /// Legacy transport: sessions keyed directly by the caller's raw token rather than an
    /// issued session id.
    pub legacy_sessions: SessionRegistry,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/mcp", get(unified_get).post(unified_post).delete(unified_delete))
        .route("/api/mcp/rpc", post(legacy_rpc))
        .route("/api/mcp/sse/{project_id}", get(legacy_sse_open))
        .route("/api/mcp/sse/{project_id}/message", post(legacy_sse_message))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": "unauthorized" }))).into_response()
}

fn error_body(code: &str, message: impl Into<String>) -> Value {
    json!({ "error": code, "message": message.into() })
}

fn accepts(headers: &HeaderMap, media_type: &str) -> bool {
    headers
        .get(axum::http::header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains(media_type) || accept.contains("*/*"))
}

fn session_id_header(headers: &HeaderMap) -> Option<String> {
    headers.get("Mcp-Session-Id").and_then(|v| v.to_str().ok()).map(str::to_string)
}

/// Validate the transport-level `MCP-Protocol-Version` header: absent assumes
/// [`crate::config::api::DEFAULT_PROTOCOL_VERSION`], present-but-unsupported is rejected.
/// This is distinct from the JSON-RPC `initialize` call's body-level `protocolVersion`, which
/// the dispatcher checks on its own.
fn reject_unsupported_protocol_header(headers: &HeaderMap, config: &Config) -> Option<Response> {
    let version =
        headers.get("MCP-Protocol-Version").and_then(|v| v.to_str().ok()).unwrap_or(crate::config::api::DEFAULT_PROTOCOL_VERSION);
    if config.supports_protocol_version(version) {
        None
    } else {
        Some(
            (
                StatusCode::BAD_REQUEST,
                Json(error_body("unsupported_protocol_version", format!("unsupported MCP-Protocol-Version: {version}"))),
            )
                .into_response(),
        )
    }
}

fn parse_request(body: &Bytes) -> Result<JsonRpcRequest, JsonRpcResponse> {
    serde_json::from_slice(body)
        .map_err(|e| JsonRpcResponse::error(None, crate::error::RpcError::parse(format!("parse error: {e}"))))
}

// ---------------------------------------------------------------------------
// Unified endpoint
// ---------------------------------------------------------------------------

async fn unified_post(State(state): State<Arc<AppState>>, headers: HeaderMap, body: Bytes) -> Response {
    let Some(caller) = extract_caller(&headers) else { return unauthorized() };

    if let Some(rejection) = reject_unsupported_protocol_header(&headers, &state.config) {
        return rejection;
    }

    if !accepts(&headers, "application/json") && !accepts(&headers, "text/event-stream") {
        return (
            StatusCode::BAD_REQUEST,
            Json(error_body("invalid_accept_header", "Accept must include application/json or text/event-stream")),
        )
            .into_response();
    }

    let header_id = session_id_header(&headers);
    let session = match &header_id {
        Some(id) => match state.sessions.get(id).await {
            Some(session) => session,
            None => {
                return (StatusCode::NOT_FOUND, Json(error_body("session_not_found", format!("unknown session: {id}"))))
                    .into_response()
            }
        },
        // Not yet registered: valid only for this one request, until `initialize` succeeds.
        None => state.sessions.create_pending().await,
    };
    session.touch().await;

    let request = match parse_request(&body) {
        Ok(r) => r,
        Err(response) => return (StatusCode::OK, Json(response)).into_response(),
    };

    if !request.is_valid_version() {
        let response =
            JsonRpcResponse::error(request.id.clone(), crate::error::RpcError::invalid_request("jsonrpc must be \"2.0\""));
        return (StatusCode::OK, Json(response)).into_response();
    }

    if request.is_response_only() {
        return StatusCode::ACCEPTED.into_response();
    }

    if request.is_notification() {
        state.dispatcher.dispatch_notification(&session, &request).await;
        return StatusCode::ACCEPTED.into_response();
    }

    let was_initialize = request.method == "initialize";
    let response = state.dispatcher.dispatch_call(&session, &caller, request).await;

    if was_initialize && response.error.is_none() {
        state.sessions.insert(session.clone()).await;
    }

    let mut http_response = (StatusCode::OK, Json(response)).into_response();
    if was_initialize && http_response.status() == StatusCode::OK {
        if let Ok(value) = axum::http::HeaderValue::from_str(&session.id) {
            http_response.headers_mut().insert("Mcp-Session-Id", value);
        }
    }
    http_response
}

async fn unified_get(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(rejection) = reject_unsupported_protocol_header(&headers, &state.config) {
        return rejection;
    }

    if !accepts(&headers, "text/event-stream") {
        return (StatusCode::METHOD_NOT_ALLOWED, Json(error_body("sse_not_supported", "GET requires Accept: text/event-stream")))
            .into_response();
    }
    let Some(id) = session_id_header(&headers) else {
        return (StatusCode::BAD_REQUEST, Json(error_body("missing_session_id", "Mcp-Session-Id is required"))).into_response();
    };
    let Some(session) = state.sessions.get(&id).await else {
        return (StatusCode::NOT_FOUND, Json(error_body("session_not_found", format!("unknown session: {id}")))).into_response();
    };
    session.touch().await;

    let last_event_id = headers.get("Last-Event-ID").and_then(|v| v.to_str().ok()).and_then(|s| s.parse::<u64>().ok());
    sse_response(&session, last_event_id).await
}

async fn unified_delete(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let Some(id) = session_id_header(&headers) else {
        return (StatusCode::BAD_REQUEST, Json(error_body("missing_session_id", "Mcp-Session-Id is required"))).into_response();
    };
    if state.sessions.terminate(&id).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        (StatusCode::NOT_FOUND, Json(error_body("session_not_found", format!("unknown session: {id}")))).into_response()
    }
}

fn to_sse_item(event: BufferedEvent) -> Result<SseEvent, Infallible> {
    Ok(event.to_sse_event())
}

/// Build the SSE response for a GET attach: register the attachment, emit a priming event,
/// replay anything since `last_event_id` if presented, then fall through to the live
/// broadcast stream with keep-alives.
async fn sse_response(session: &Arc<Session>, last_event_id: Option<u64>) -> Response {
    let rx = session.streams.subscribe();
    let live = BroadcastStream::new(rx).filter_map(|item| async move { item.ok().map(to_sse_item) });

    let priming_id = session.events.allocate_id();
    let priming = SseEvent::default().id(priming_id.to_string()).data("");

    let replay: Vec<Result<SseEvent, Infallible>> = match last_event_id {
        Some(id) => session.events.since(id).await.into_iter().map(to_sse_item).collect(),
        None => Vec::new(),
    };

    let combined = stream::once(async move { Ok::<SseEvent, Infallible>(priming) })
        .chain(stream::iter(replay))
        .chain(live);

    Sse::new(combined).keep_alive(KeepAlive::new().interval(crate::config::api::SSE_KEEPALIVE_INTERVAL).text("")).into_response()
}

// ---------------------------------------------------------------------------
// Legacy POST-only JSON-RPC transport
// ---------------------------------------------------------------------------

async fn legacy_rpc(State(state): State<Arc<AppState>>, headers: HeaderMap, body: Bytes) -> Response {
    let Some(caller) = extract_caller(&headers) else { return unauthorized() };
    let Some(token_key) = legacy_token_key(&headers) else { return unauthorized() };

    if let Some(rejection) = reject_unsupported_protocol_header(&headers, &state.config) {
        return rejection;
    }

    let request = match parse_request(&body) {
        Ok(r) => r,
        Err(response) => return (StatusCode::OK, Json(response)).into_response(),
    };

    if !request.is_valid_version() {
        let response =
            JsonRpcResponse::error(request.id.clone(), crate::error::RpcError::invalid_request("jsonrpc must be \"2.0\""));
        return (StatusCode::OK, Json(response)).into_response();
    }

    let session = match state.legacy_sessions.get(&token_key).await {
        Some(session) => session,
        None if request.method == "initialize" => {
            let session = Arc::new(Session::new(token_key.clone(), state.config.event_window));
            state.legacy_sessions.insert(session.clone()).await;
            session
        }
        None => {
            let response = JsonRpcResponse::error(request.id.clone(), crate::error::RpcError::uninitialized_session());
            return (StatusCode::OK, Json(response)).into_response();
        }
    };
    session.touch().await;

    if request.is_notification() {
        state.dispatcher.dispatch_notification(&session, &request).await;
        return StatusCode::ACCEPTED.into_response();
    }

    let response = state.dispatcher.dispatch_call(&session, &caller, request).await;
    (StatusCode::OK, Json(response)).into_response()
}

/// The legacy transport keys sessions by the caller's raw bearer token or API key rather
/// than an issued session id. Bearer takes precedence over the API key.
fn legacy_token_key(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers.get(axum::http::header::AUTHORIZATION) {
        if let Ok(raw) = auth.to_str() {
            if let Some(token) = raw.strip_prefix("Bearer ") {
                if !token.is_empty() {
                    return Some(format!("bearer:{token}"));
                }
            }
        }
    }
    headers.get("X-API-Key").and_then(|v| v.to_str().ok()).filter(|s| !s.is_empty()).map(|k| format!("apikey:{k}"))
}

// ---------------------------------------------------------------------------
// Legacy project-scoped SSE pair
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SessionIdQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

async fn legacy_sse_open(State(state): State<Arc<AppState>>, Path(project_id): Path<String>, headers: HeaderMap) -> Response {
    if extract_caller(&headers).is_none() {
        return unauthorized();
    }
    let session = state.sessions.allocate().await;
    let endpoint_url = format!("{}/api/mcp/sse/{project_id}/message?sessionId={}", state.config.base_url, session.id);

    let rx = session.streams.subscribe();
    let live = BroadcastStream::new(rx).filter_map(|item| async move { item.ok().map(to_sse_item) });
    let endpoint_event = stream::once(async move { Ok::<SseEvent, Infallible>(SseEvent::default().event("endpoint").data(endpoint_url)) });

    Sse::new(endpoint_event.chain(live))
        .keep_alive(
            KeepAlive::new()
                .interval(crate::config::api::LEGACY_SSE_PING_INTERVAL)
                .event(SseEvent::default().event("ping").data(chrono::Utc::now().to_rfc3339())),
        )
        .into_response()
}

async fn legacy_sse_message(
    State(state): State<Arc<AppState>>,
    Path(_project_id): Path<String>,
    Query(query): Query<SessionIdQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(caller) = extract_caller(&headers) else { return unauthorized() };
    let Some(session_id) = query.session_id else {
        return (StatusCode::BAD_REQUEST, Json(error_body("missing_session_id", "sessionId query parameter is required")))
            .into_response();
    };
    let Some(session) = state.sessions.get(&session_id).await else {
        return (StatusCode::NOT_FOUND, Json(error_body("session_not_found", format!("unknown session: {session_id}"))))
            .into_response();
    };
    session.touch().await;

    let request = match parse_request(&body) {
        Ok(r) => r,
        Err(response) => return (StatusCode::ACCEPTED, Json(response)).into_response(),
    };

    let response = if request.is_notification() {
        state.dispatcher.dispatch_notification(&session, &request).await;
        JsonRpcResponse::success(None, Value::Null)
    } else {
        state.dispatcher.dispatch_call(&session, &caller, request).await
    };

    // Reply on the SSE channel too, if the session is still alive, in addition to the
    // HTTP-body copy returned below.
    if session.streams.listener_count() > 0 {
        let payload = serde_json::to_string(&response).unwrap_or_default();
        let event = session.events.push("message", payload).await;
        session.streams.send(event);
    }

    (StatusCode::ACCEPTED, Json(response)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sse_response_replays_strictly_after_the_presented_id() {
        let session = Arc::new(Session::new("s".to_string(), 10));
        session.events.allocate_id(); // priming event, id 0
        session.events.push("message", "1").await; // id 1
        session.events.push("message", "2").await; // id 2
        session.events.push("message", "3").await; // id 3

        // A client presenting `Last-Event-ID: 2` has already seen event 2; replay must start
        // strictly after it, at event 3.
        let replay = session.events.since(2).await;
        assert_eq!(replay.iter().map(|e| e.id).collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn legacy_token_key_prefers_bearer_over_api_key() {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, axum::http::HeaderValue::from_static("Bearer tok"));
        headers.insert("X-API-Key", axum::http::HeaderValue::from_static("key"));
        assert_eq!(legacy_token_key(&headers).unwrap(), "bearer:tok");
    }

    #[test]
    fn accepts_matches_substring_of_accept_header() {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::ACCEPT, axum::http::HeaderValue::from_static("text/event-stream, application/json"));
        assert!(accepts(&headers, "application/json"));
        assert!(accepts(&headers, "text/event-stream"));
    }
}
