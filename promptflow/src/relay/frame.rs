//! Outward events and their wire encoding.

use super::FailureDescription;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// The fixed vocabulary of events a client can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Connection acknowledgement, always first.
    Ready,
    /// One run notification, forwarded verbatim.
    Progress,
    /// The run's final result.
    Final,
    /// The run failed.
    Error,
    /// End of stream, always last.
    Done,
}

impl EventKind {
    /// Returns the name written on the `event:` line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Progress => "progress",
            Self::Final => "final",
            Self::Error => "error",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single event on the output stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutwardEvent {
    /// What kind of event this is.
    pub kind: EventKind,
    /// JSON payload.
    pub data: Value,
}

impl OutwardEvent {
    /// Creates an event.
    #[must_use]
    pub const fn new(kind: EventKind, data: Value) -> Self {
        Self { kind, data }
    }

    /// `ready` with `{ "ok": true }`.
    #[must_use]
    pub fn ready() -> Self {
        Self::new(EventKind::Ready, json!({ "ok": true }))
    }

    /// `progress` carrying a notification as-is.
    #[must_use]
    pub const fn progress(notification: Value) -> Self {
        Self::new(EventKind::Progress, notification)
    }

    /// `final` carrying the run result.
    #[must_use]
    pub const fn final_result(result: Value) -> Self {
        Self::new(EventKind::Final, result)
    }

    /// `error` describing a failure.
    #[must_use]
    pub fn error(failure: &FailureDescription) -> Self {
        let data = serde_json::to_value(failure)
            .unwrap_or_else(|_| json!({ "message": failure.message }));
        Self::new(EventKind::Error, data)
    }

    /// `done` with `{ "ok": true }`.
    #[must_use]
    pub fn done() -> Self {
        Self::new(EventKind::Done, json!({ "ok": true }))
    }

    /// Encodes the event as one frame: `event: <kind>\ndata: <json>\n\n`.
    ///
    /// The payload is compact JSON, so it never spans more than one line.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        Bytes::from(format!("event: {}\ndata: {}\n\n", self.kind, self.data))
    }
}
