//! Pipeline configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// What a stage sees of the stages before it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextPolicy {
    /// Every stage is driven by the original prompt only.
    #[default]
    Isolated,
    /// Each stage also receives the previous stage's output.
    Threaded,
}

impl fmt::Display for ContextPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Isolated => write!(f, "isolated"),
            Self::Threaded => write!(f, "threaded"),
        }
    }
}

impl FromStr for ContextPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "isolated" => Ok(Self::Isolated),
            "threaded" => Ok(Self::Threaded),
            other => Err(format!(
                "unknown context policy '{other}', expected 'isolated' or 'threaded'"
            )),
        }
    }
}

/// Execution settings for a pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// How stage outputs flow into later stages.
    #[serde(default)]
    pub context_policy: ContextPolicy,
    /// Per-stage time limit in seconds. `None` disables the limit.
    #[serde(default)]
    pub stage_timeout_seconds: Option<f64>,
}

impl PipelineConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the context policy.
    #[must_use]
    pub const fn with_context_policy(mut self, policy: ContextPolicy) -> Self {
        self.context_policy = policy;
        self
    }

    /// Sets the per-stage timeout.
    #[must_use]
    pub const fn with_stage_timeout_seconds(mut self, seconds: Option<f64>) -> Self {
        self.stage_timeout_seconds = seconds;
        self
    }

    /// Returns the per-stage timeout.
    ///
    /// Values that are not positive, or too large for a `Duration`, mean no timeout.
    #[must_use]
    pub fn stage_timeout(&self) -> Option<Duration> {
        self.stage_timeout_seconds
            .filter(|s| *s > 0.0)
            .and_then(|s| Duration::try_from_secs_f64(s).ok())
    }
}
