//! Live SSE fan-out for attached listeners.
//!
//! A session may have zero or one active GET-stream listener at a time under the unified
//! transport, but the legacy project-scoped SSE endpoint can attach independently. Both are
//! modeled as subscribers on the same broadcast channel so a server-initiated message (e.g. a
//! notification pushed by a tool handler) reaches whichever transport is currently attached.

use tokio::sync::broadcast;

use super::event_store::BufferedEvent;

const CHANNEL_CAPACITY: usize = 256;

/// Broadcast fan-out for one session's live events. Independent from [`super::event_store::EventStore`]:
/// the store is the durable replay log, this is the live-delivery side. A handler always
/// pushes to the store first (to obtain an id) then broadcasts the resulting event.
pub struct StreamRegistry {
    tx: broadcast::Sender<BufferedEvent>,
}

impl StreamRegistry {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BufferedEvent> {
        self.tx.subscribe()
    }

    /// Deliver to whoever is currently attached. A lagging or absent subscriber is not an
    /// error: the event remains in the durable store for `Last-Event-ID` replay.
    pub fn send(&self, event: BufferedEvent) {
        let _ = self.tx.send(event);
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for StreamRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_sent_events() {
        let registry = StreamRegistry::new();
        let mut rx = registry.subscribe();
        registry.send(BufferedEvent::new(1, "message", "{}"));
        let received = rx.recv().await.unwrap();
        assert_eq!(received.id, 1);
    }

    #[tokio::test]
    async fn send_with_no_listeners_does_not_panic() {
        let registry = StreamRegistry::new();
        registry.send(BufferedEvent::new(1, "message", "{}"));
        assert_eq!(registry.listener_count(), 0);
    }
}
