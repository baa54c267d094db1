//! Event sink trait and implementations.

use crate::core::StageEvent;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

/// Trait for sinks that receive progress events from a run.
///
/// Emitting never fails; a sink whose consumer has gone away drops events.
pub trait EventSink: Send + Sync {
    /// Emits an event.
    fn emit(&self, event: StageEvent);
}

/// Forwards events, as JSON notifications, into an unbounded channel.
///
/// The channel closes when the sink is dropped, which ends the receiving
/// notification sequence.
#[derive(Debug)]
pub struct ChannelEventSink {
    tx: mpsc::UnboundedSender<serde_json::Value>,
}

impl ChannelEventSink {
    /// Creates a sink and the receiver for its notifications.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<serde_json::Value>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: StageEvent) {
        debug!(event_type = %event.event_type, "Progress event");
        if self.tx.send(event.into_notification()).is_err() {
            debug!("Notification receiver dropped; discarding event");
        }
    }
}

/// Records every event in memory. Used by tests and benchmarks.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: Mutex<Vec<StageEvent>>,
}

impl CollectingEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<StageEvent> {
        self.events.lock().clone()
    }

    /// Event types in emission order.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .map(|event| event.event_type.clone())
            .collect()
    }

    /// Recorded events whose type starts with `prefix`.
    #[must_use]
    pub fn matching(&self, prefix: &str) -> Vec<StageEvent> {
        let events = self.events.lock();
        events
            .iter()
            .filter(|event| event.event_type.starts_with(prefix))
            .cloned()
            .collect()
    }
}

impl EventSink for CollectingEventSink {
    fn emit(&self, event: StageEvent) {
        self.events.lock().push(event);
    }
}
