//! Final run output aggregated from the stage results.

use serde::{Deserialize, Serialize};

/// The text artifact produced by one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    /// Stage name.
    pub name: String,
    /// Text returned by the generation capability.
    pub output: String,
    /// Execution time in milliseconds.
    pub duration_ms: f64,
}

impl StageRecord {
    /// Creates a new stage record.
    #[must_use]
    pub fn new(name: impl Into<String>, output: impl Into<String>, duration_ms: f64) -> Self {
        Self {
            name: name.into(),
            output: output.into(),
            duration_ms,
        }
    }
}

/// The aggregated result of a completed run.
///
/// Sent to the client as the `final` event payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutput {
    /// Run identifier.
    pub run_id: String,
    /// The last stage's text output.
    pub output: String,
    /// Every stage's artifact, in execution order.
    pub stages: Vec<StageRecord>,
    /// Total execution time in milliseconds.
    pub duration_ms: f64,
}

impl RunOutput {
    /// Builds the run output from the executed stages.
    #[must_use]
    pub fn from_stages(run_id: impl Into<String>, stages: Vec<StageRecord>, duration_ms: f64) -> Self {
        let output = stages.last().map(|s| s.output.clone()).unwrap_or_default();
        Self {
            run_id: run_id.into(),
            output,
            stages,
            duration_ms,
        }
    }

    /// Returns the output of a stage by name.
    #[must_use]
    pub fn stage_output(&self, name: &str) -> Option<&str> {
        self.stages
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.output.as_str())
    }
}
