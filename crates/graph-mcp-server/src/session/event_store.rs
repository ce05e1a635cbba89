//! Bounded per-session event ring buffer with `Last-Event-ID` replay support.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

/// A single buffered SSE event, tagged with a monotonically increasing id unique
/// within its session.
#[derive(Clone, Debug, serde::Serialize)]
pub struct BufferedEvent {
    pub id: u64,
    pub event_type: String,
    pub data: String,
    pub created_at: DateTime<Utc>,
}

impl BufferedEvent {
    #[must_use]
    pub fn new(id: u64, event_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self { id, event_type: event_type.into(), data: data.into(), created_at: Utc::now() }
    }

    /// Render as an Axum SSE `Event`, with the id set so the client can resume from it.
    #[must_use]
    pub fn to_sse_event(&self) -> axum::response::sse::Event {
        axum::response::sse::Event::default()
            .id(self.id.to_string())
            .event(self.event_type.clone())
            .data(self.data.clone())
    }
}

/// Ring buffer of the last `window` events for a session, with a monotonic id
/// counter that never resets even as old events are pruned.
pub struct EventStore {
    window: usize,
    next_id: AtomicU64,
    events: RwLock<VecDeque<BufferedEvent>>,
}

impl EventStore {
    #[must_use]
    pub fn new(window: usize) -> Self {
        Self { window, next_id: AtomicU64::new(0), events: RwLock::new(VecDeque::with_capacity(window)) }
    }

    /// Reserve the next event id and record the event, head-pruning if the
    /// window is full.
    pub async fn push(&self, event_type: impl Into<String>, data: impl Into<String>) -> BufferedEvent {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let event = BufferedEvent::new(id, event_type, data);
        let mut events = self.events.write().await;
        if events.len() >= self.window {
            events.pop_front();
        }
        events.push_back(event.clone());
        event
    }

    /// Events strictly after `last_event_id`, oldest first. If `last_event_id`
    /// is older than everything retained, returns every buffered event — the
    /// caller decides whether a gap means a hard resync is required.
    pub async fn since(&self, last_event_id: u64) -> Vec<BufferedEvent> {
        self.events.read().await.iter().filter(|e| e.id > last_event_id).cloned().collect()
    }

    #[must_use]
    pub fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
