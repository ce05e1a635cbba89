//! Session lifecycle: allocate, initialize, touch, terminate.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use uuid::Uuid;

use super::event_store::EventStore;
use super::streams::StreamRegistry;

/// Session timeout after which a background sweep may remove it.
const SESSION_TIMEOUT: Duration = Duration::from_secs(3600);

/// One MCP session: the JSON-RPC initialize handshake state, the event store backing
/// `Last-Event-ID` replay, and the broadcast registry for live delivery.
pub struct Session {
    pub id: String,
    pub events: EventStore,
    pub streams: StreamRegistry,
    /// Project id attached at `initialize` time, if the client supplied one. Project-scoped
    /// tool calls that omit an explicit `project_id` argument fall back to this.
    pub default_project_id: RwLock<Option<Uuid>>,
    pub protocol_version: RwLock<Option<String>>,
    pub initialized: RwLock<bool>,
    pub created_at: Instant,
    last_active: RwLock<Instant>,
}

impl Session {
    #[must_use]
    pub fn new(id: String, event_window: usize) -> Self {
        Self {
            id,
            events: EventStore::new(event_window),
            streams: StreamRegistry::new(),
            default_project_id: RwLock::new(None),
            protocol_version: RwLock::new(None),
            initialized: RwLock::new(false),
            created_at: Instant::now(),
            last_active: RwLock::new(Instant::now()),
        }
    }

    pub async fn mark_initialized(&self, protocol_version: String, default_project_id: Option<Uuid>) {
        *self.initialized.write().await = true;
        *self.protocol_version.write().await = Some(protocol_version);
        *self.default_project_id.write().await = default_project_id;
    }

    pub async fn is_initialized(&self) -> bool {
        *self.initialized.read().await
    }

    pub async fn touch(&self) {
        *self.last_active.write().await = Instant::now();
    }

    pub async fn is_stale(&self) -> bool {
        self.last_active.read().await.elapsed() > SESSION_TIMEOUT
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("id", &self.id).field("created_at", &self.created_at).finish()
    }
}

/// Registry of all live sessions, keyed by the opaque session id issued at `initialize`.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, Arc<Session>>>>,
    event_window: usize,
}

impl SessionRegistry {
    #[must_use]
    pub fn new(event_window: usize) -> Self {
        Self { sessions: Arc::new(RwLock::new(HashMap::new())), event_window }
    }

    /// Allocate a fresh session and register it. The caller assigns the returned session's
    /// id as the `Mcp-Session-Id` response header.
    pub async fn allocate(&self) -> Arc<Session> {
        let session = self.create_pending().await;
        self.insert(session.clone()).await;
        session
    }

    /// Mint a fresh session id without registering it. Used by the unified POST handler for
    /// a caller that presented no `Mcp-Session-Id`: the session is only inserted once its
    /// `initialize` call succeeds, so an id is never valid for any *other* request until then.
    #[must_use]
    pub async fn create_pending(&self) -> Arc<Session> {
        let id = Uuid::new_v4().to_string();
        Arc::new(Session::new(id, self.event_window))
    }

    /// Register a session (or re-register an already-known one; idempotent either way).
    pub async fn insert(&self, session: Arc<Session>) {
        let id = session.id.clone();
        self.sessions.write().await.insert(id.clone(), session);
        tracing::info!(session_id = %id, "session registered");
    }

    pub async fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Terminate a session (DELETE on the unified endpoint). Returns whether a session with
    /// that id existed.
    pub async fn terminate(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            tracing::info!(session_id = %id, "session terminated");
        }
        removed
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Remove sessions that have seen no activity within the timeout window. Intended to
    /// be driven by a periodic background task.
    pub async fn sweep_stale(&self) -> usize {
        let mut stale_ids = Vec::new();
        for (id, session) in self.sessions.read().await.iter() {
            if session.is_stale().await {
                stale_ids.push(id.clone());
            }
        }
        let count = stale_ids.len();
        if count > 0 {
            let mut sessions = self.sessions.write().await;
            for id in stale_ids {
                sessions.remove(&id);
            }
            tracing::debug!(count, "swept stale sessions");
        }
        count
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(crate::config::api::EVENT_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allocate_then_lookup_round_trips() {
        let registry = SessionRegistry::new(10);
        let session = registry.allocate().await;
        let found = registry.get(&session.id).await;
        assert!(found.is_some());
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn unknown_session_id_is_none() {
        let registry = SessionRegistry::new(10);
        assert!(registry.get("does-not-exist").await.is_none());
    }

    #[tokio::test]
    async fn terminate_removes_session() {
        let registry = SessionRegistry::new(10);
        let session = registry.allocate().await;
        assert!(registry.terminate(&session.id).await);
        assert!(registry.get(&session.id).await.is_none());
        assert!(!registry.terminate(&session.id).await);
    }

    #[tokio::test]
    async fn mark_initialized_records_protocol_version_and_project() {
        let registry = SessionRegistry::new(10);
        let session = registry.allocate().await;
        assert!(!session.is_initialized().await);
        let project = Uuid::new_v4();
        session.mark_initialized("2025-06-18".to_string(), Some(project)).await;
        assert!(session.is_initialized().await);
        assert_eq!(*session.default_project_id.read().await, Some(project));
    }
}
