//! Event fan-out: how session news reaches subscribers.
//!
//! The engine publishes through the [`EventSink`] trait and moves on.
//! Publishing is synchronous, non-blocking, and fire-and-forget: a slow
//! or broken sink must never stall or fail a lifecycle operation, so
//! every engine call site goes through [`dispatch`], which logs a
//! failure and continues.
//!
//! Two sinks ship with the engine:
//!
//! - [`NullSink`] discards everything (tests, batch tooling).
//! - [`BroadcastSink`] fans out over a tokio broadcast channel for
//!   in-process subscribers; a WebSocket gateway would drain a
//!   subscription and forward to its rooms by [`Topic`] routing key.

use tokio::sync::broadcast;

use parlor_model::{Notification, Topic};

/// A sink rejected or failed to accept an event.
///
/// Carries the sink's own description. The engine only ever logs this;
/// it never propagates to callers.
#[derive(Debug, thiserror::Error)]
#[error("event fan-out failed: {0}")]
pub struct PublishError(pub String);

/// Accepts events published against topics.
///
/// Implementations must return quickly: buffer, enqueue, or drop, but
/// never block on delivery. Delivery guarantees are whatever the
/// implementation chooses; the engine promises nothing downstream.
pub trait EventSink: Send + Sync + 'static {
    /// Offers one event for delivery to `topic`'s subscribers.
    fn publish(&self, topic: Topic, event: Notification) -> Result<(), PublishError>;
}

// ---------------------------------------------------------------------------
// NullSink
// ---------------------------------------------------------------------------

/// A sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _topic: Topic, _event: Notification) -> Result<(), PublishError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// BroadcastSink
// ---------------------------------------------------------------------------

/// Fans events out over a tokio broadcast channel.
///
/// Every subscriber sees every `(topic, event)` pair and filters by
/// topic itself. Lagging subscribers lose the oldest events (broadcast
/// channel semantics), which fits notification traffic: the current
/// state can always be re-read from the engine.
pub struct BroadcastSink {
    tx: broadcast::Sender<(Topic, Notification)>,
}

impl BroadcastSink {
    /// Creates a sink whose channel buffers `capacity` events per
    /// subscriber before lagging kicks in.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Opens a new subscription. Events published before this call are
    /// not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<(Topic, Notification)> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl EventSink for BroadcastSink {
    fn publish(&self, topic: Topic, event: Notification) -> Result<(), PublishError> {
        // send() errs only when nobody is subscribed; with no listeners
        // there is nothing to deliver, so that is not a failure.
        let _ = self.tx.send((topic, event));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// dispatch — the engine's only publish path
// ---------------------------------------------------------------------------

/// Publishes and swallows failure, logging it instead. State changes
/// commit to storage before the event goes out, so a lost notification
/// leaves the system correct and merely under-announced.
pub(crate) fn dispatch<E: EventSink>(
    sink: &E,
    topic: Topic,
    event: impl Into<Notification>,
) {
    let event = event.into();
    if let Err(error) = sink.publish(topic, event) {
        tracing::warn!(%topic, %error, "event publish failed, continuing");
    }
}

// ---------------------------------------------------------------------------
// Test support
// ---------------------------------------------------------------------------


// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::testing::{FailingSink, RecordingSink};
    use super::*;
    use parlor_model::{SessionEvent, SessionId};

    fn ended(id: u64) -> Notification {
        Notification::from(SessionEvent::SessionEnded {
            session_id: SessionId(id),
        })
    }

    #[test]
    fn test_null_sink_accepts_everything() {
        let sink = NullSink;
        let result = sink.publish(Topic::Session(SessionId(1)), ended(1));
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_broadcast_sink_delivers_to_every_subscriber() {
        let sink = BroadcastSink::new(8);
        let mut first = sink.subscribe();
        let mut second = sink.subscribe();

        sink.publish(Topic::Session(SessionId(7)), ended(7))
            .expect("publish should succeed");

        let (topic, event) = first.recv().await.unwrap();
        assert_eq!(topic, Topic::Session(SessionId(7)));
        assert_eq!(event, ended(7));

        let (topic, _) = second.recv().await.unwrap();
        assert_eq!(topic, Topic::Session(SessionId(7)));
    }

    #[test]
    fn test_broadcast_sink_without_subscribers_is_not_an_error() {
        let sink = BroadcastSink::new(8);
        assert_eq!(sink.subscriber_count(), 0);
        let result = sink.publish(Topic::Session(SessionId(1)), ended(1));
        assert!(result.is_ok());
    }

    #[test]
    fn test_recording_sink_captures_in_order() {
        let sink = RecordingSink::new();
        dispatch(&sink, Topic::Session(SessionId(1)), ended(1));
        dispatch(&sink, Topic::Session(SessionId(2)), ended(2));

        let published = sink.take();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].0, Topic::Session(SessionId(1)));
        assert_eq!(published[1].0, Topic::Session(SessionId(2)));
    }

    #[test]
    fn test_dispatch_swallows_sink_failure() {
        // Must not panic or propagate; failure only gets logged.
        dispatch(&FailingSink, Topic::Session(SessionId(1)), ended(1));
    }
}
