//! Progress notifications emitted by a run.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Lifecycle event emitted while a run executes.
///
/// Serialized as `{"type", "timestamp", "data"}` and forwarded verbatim as
/// the payload of a `progress` frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageEvent {
    /// Dotted event type, e.g. `stage.completed`.
    #[serde(rename = "type")]
    pub event_type: String,

    /// RFC 3339 time of emission.
    pub timestamp: String,

    /// Event fields.
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl StageEvent {
    fn with_fields<const N: usize>(event_type: &str, fields: [(&str, Value); N]) -> Self {
        Self {
            event_type: event_type.to_string(),
            timestamp: crate::utils::iso_timestamp(),
            data: fields
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
        }
    }

    /// Returns a field of the payload.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Returns the stage this event belongs to, if any.
    #[must_use]
    pub fn stage(&self) -> Option<&str> {
        self.field("stage").and_then(Value::as_str)
    }

    /// Converts the event into the opaque notification value.
    #[must_use]
    pub fn into_notification(self) -> Value {
        json!({
            "type": self.event_type,
            "timestamp": self.timestamp,
            "data": self.data,
        })
    }

    /// `pipeline.started`, listing the stages about to run.
    #[must_use]
    pub fn pipeline_started(pipeline: &str, run_id: &str, stages: &[&str]) -> Self {
        Self::with_fields(
            "pipeline.started",
            [
                ("pipeline", json!(pipeline)),
                ("run_id", json!(run_id)),
                ("stages", json!(stages)),
            ],
        )
    }

    /// `pipeline.completed`.
    #[must_use]
    pub fn pipeline_completed(pipeline: &str, duration_ms: f64) -> Self {
        Self::with_fields(
            "pipeline.completed",
            [("pipeline", json!(pipeline)), ("duration_ms", json!(duration_ms))],
        )
    }

    /// `stage.started` with the stage's position.
    #[must_use]
    pub fn started(stage: &str, index: usize) -> Self {
        Self::with_fields("stage.started", [("stage", json!(stage)), ("index", json!(index))])
    }

    /// `stage.completed` carrying the stage's text output.
    #[must_use]
    pub fn completed(stage: &str, duration_ms: f64, output: &str) -> Self {
        Self::with_fields(
            "stage.completed",
            [
                ("stage", json!(stage)),
                ("duration_ms", json!(duration_ms)),
                ("output", json!(output)),
            ],
        )
    }

    /// `stage.failed`.
    #[must_use]
    pub fn failed(stage: &str, error: &str) -> Self {
        Self::with_fields("stage.failed", [("stage", json!(stage)), ("error", json!(error))])
    }
}
