//! Authenticated-caller extraction from request headers.
//!
//! The real auth service — bearer/API-key verification, org/project membership checks — is
//! an external collaborator. This module implements only the consumed shape: given the raw
//! header bytes the gateway actually receives, produce a deterministic [`AuthenticatedCaller`].
//! Bearer takes precedence over `X-API-Key` when both are present.

use axum::http::HeaderMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Bearer,
    ApiKey,
}

/// The caller identity the MCP core consumes. `user_id`/`organization_id` are derived
/// deterministically from the token bytes (a stand-in for a real token-introspection call);
/// `project_id` is the caller's default project binding, used when a session has none.
#[derive(Debug, Clone)]
pub struct AuthenticatedCaller {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub project_id: Option<Uuid>,
    pub token_kind: TokenKind,
}

impl AuthenticatedCaller {
    /// Build a caller from raw token bytes. `project_id` is looked up separately (callers
    /// bind it via `X-Project-Id` or leave it to session/params resolution).
    fn from_token(token: &str, token_kind: TokenKind) -> Self {
        let digest = md5::compute(token.as_bytes());
        let bytes = digest.0;
        let user_id = Uuid::from_bytes(bytes);
        let mut org_bytes = bytes;
        org_bytes.reverse();
        let organization_id = Uuid::from_bytes(org_bytes);
        Self { user_id, organization_id, project_id: None, token_kind }
    }
}

/// Extract an [`AuthenticatedCaller`] from request headers, or `None` if neither
/// `Authorization: Bearer <token>` nor `X-API-Key` is present.
#[must_use]
pub fn extract_caller(headers: &HeaderMap) -> Option<AuthenticatedCaller> {
    if let Some(auth) = headers.get(axum::http::header::AUTHORIZATION) {
        if let Ok(raw) = auth.to_str() {
            if let Some(token) = raw.strip_prefix("Bearer ") {
                if !token.is_empty() {
                    let mut caller = AuthenticatedCaller::from_token(token, TokenKind::Bearer);
                    caller.project_id = project_id_header(headers);
                    return Some(caller);
                }
            }
        }
    }
    if let Some(key) = headers.get("X-API-Key") {
        if let Ok(raw) = key.to_str() {
            if !raw.is_empty() {
                let mut caller = AuthenticatedCaller::from_token(raw, TokenKind::ApiKey);
                caller.project_id = project_id_header(headers);
                return Some(caller);
            }
        }
    }
    None
}

fn project_id_header(headers: &HeaderMap) -> Option<Uuid> {
    headers.get("X-Project-Id").and_then(|v| v.to_str().ok()).and_then(|s| Uuid::parse_str(s).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_takes_precedence_over_api_key() {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_static("Bearer tok-a"));
        headers.insert("X-API-Key", HeaderValue::from_static("key-b"));
        let caller = extract_caller(&headers).unwrap();
        assert_eq!(caller.token_kind, TokenKind::Bearer);
    }

    #[test]
    fn same_token_yields_the_same_caller() {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_static("Bearer same-token"));
        let first = extract_caller(&headers).unwrap();
        let second = extract_caller(&headers).unwrap();
        assert_eq!(first.user_id, second.user_id);
    }

    #[test]
    fn no_headers_yields_no_caller() {
        let headers = HeaderMap::new();
        assert!(extract_caller(&headers).is_none());
    }

    #[test]
    fn empty_bearer_token_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(extract_caller(&headers).is_none());
    }
}
