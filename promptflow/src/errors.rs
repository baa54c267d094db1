//! Error types for the promptflow pipeline and relay.
//!
//! Every failure a run can hit is represented by [`PipelineError`]. The
//! generation capability reports its own failures as [`GenerationError`],
//! which carries the optional `message`/`name` pair that ends up on the
//! outward `error` event.

use serde::{Deserialize, Serialize};
use std::any::Any;
use thiserror::Error;

/// Message used whenever a failure carries no usable text.
pub const FALLBACK_ERROR_MESSAGE: &str = "Unexpected error";

/// The main error type for pipeline runs.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// A pipeline validation error occurred.
    #[error("{0}")]
    Validation(#[from] PipelineValidationError),

    /// A stage's call to the generation capability failed.
    #[error("Stage '{stage}' failed: {source}")]
    Stage {
        /// The failing stage.
        stage: String,
        /// The underlying generation failure.
        #[source]
        source: GenerationError,
    },

    /// A stage did not finish within the configured timeout.
    #[error("Stage '{stage}' timed out after {timeout_seconds}s")]
    Timeout {
        /// The stage that timed out.
        stage: String,
        /// The configured timeout in seconds.
        timeout_seconds: f64,
    },

    /// The notification sequence itself failed.
    #[error("Notification stream failed: {0}")]
    Notifications(String),

    /// The run was cancelled.
    #[error("Pipeline cancelled: {0}")]
    Cancelled(String),

    /// The run task panicked or was aborted.
    #[error("Run aborted: {0}")]
    Aborted(String),

    /// Serialization of the final result failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PipelineError {
    /// Wraps a generation failure for the given stage.
    #[must_use]
    pub fn stage(stage: impl Into<String>, source: GenerationError) -> Self {
        Self::Stage {
            stage: stage.into(),
            source,
        }
    }

    /// Returns the stage the failure is attributed to, if any.
    #[must_use]
    pub fn stage_name(&self) -> Option<&str> {
        match self {
            Self::Stage { stage, .. } | Self::Timeout { stage, .. } => Some(stage),
            _ => None,
        }
    }

    /// Returns a short, stable name for the failure kind.
    ///
    /// Stage failures report the generation error's own name when it has one.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Validation(_) => "PipelineValidationError",
            Self::Stage { source, .. } => source.name.as_deref().unwrap_or("GenerationError"),
            Self::Timeout { .. } => "TimeoutError",
            Self::Notifications(_) => "NotificationError",
            Self::Cancelled(_) => "CancelledError",
            Self::Aborted(_) => "AbortError",
            Self::Serialization(_) => "SerializationError",
        }
    }

    /// Returns true if the error came from cancellation rather than a failure.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Best-effort message from a panic payload.
///
/// Payloads that are not strings (or are blank) yield [`FALLBACK_ERROR_MESSAGE`].
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string())
}

/// Failure value produced by the generation capability.
///
/// Both fields are optional; a failure with neither still renders as
/// [`FALLBACK_ERROR_MESSAGE`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{}", message.as_deref().filter(|m| !m.trim().is_empty()).unwrap_or(FALLBACK_ERROR_MESSAGE))]
pub struct GenerationError {
    /// Human-readable message, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Error class name, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl GenerationError {
    /// Creates a generation error with a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            name: None,
        }
    }

    /// Creates a generation error that carries neither message nor name.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Sets the error name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Reasons a pipeline definition is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineValidationError {
    /// `build` was called with no stages.
    #[error("Pipeline has no stages")]
    Empty,

    /// A stage reported a blank name.
    #[error("Stage name cannot be empty")]
    BlankStageName,

    /// Two stages share a name.
    #[error("Stage '{stage}' is already part of pipeline '{pipeline}'")]
    DuplicateStage {
        /// The repeated stage name.
        stage: String,
        /// The pipeline being built.
        pipeline: String,
    },
}

impl PipelineValidationError {
    /// Stable diagnostic code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Empty => "CONTRACT-004-EMPTY",
            Self::BlankStageName => "CONTRACT-004-NAME",
            Self::DuplicateStage { .. } => "CONTRACT-004-DUPLICATE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_error_display_uses_message() {
        let err = GenerationError::new("rate limited").with_name("HttpError");
        assert_eq!(err.to_string(), "rate limited");
        assert_eq!(err.name.as_deref(), Some("HttpError"));
    }

    #[test]
    fn test_generation_error_display_falls_back() {
        assert_eq!(GenerationError::anonymous().to_string(), FALLBACK_ERROR_MESSAGE);
        assert_eq!(GenerationError::new("   ").to_string(), FALLBACK_ERROR_MESSAGE);
    }

    #[test]
    fn test_stage_error_includes_source_text() {
        let err = PipelineError::stage("act", GenerationError::new("boom"));
        assert_eq!(err.to_string(), "Stage 'act' failed: boom");
        assert_eq!(err.name(), "GenerationError");
    }

    #[test]
    fn test_stage_error_prefers_source_name() {
        let err = PipelineError::stage("plan", GenerationError::new("x").with_name("HttpError"));
        assert_eq!(err.name(), "HttpError");
    }

    #[test]
    fn test_error_names() {
        assert_eq!(PipelineError::Cancelled("bye".into()).name(), "CancelledError");
        assert_eq!(PipelineError::Notifications("x".into()).name(), "NotificationError");
        assert!(PipelineError::Cancelled("bye".into()).is_cancelled());
        assert!(!PipelineError::Aborted("x".into()).is_cancelled());
    }

    #[test]
    fn test_panic_message_extracts_strings() {
        let payload: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(payload.as_ref()), "static message");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(payload.as_ref()), "owned message");
    }

    #[test]
    fn test_panic_message_falls_back() {
        let payload: Box<dyn Any + Send> = Box::new(42_u32);
        assert_eq!(panic_message(payload.as_ref()), FALLBACK_ERROR_MESSAGE);
    }

    #[test]
    fn test_validation_codes() {
        assert_eq!(PipelineValidationError::Empty.code(), "CONTRACT-004-EMPTY");
        assert_eq!(PipelineValidationError::BlankStageName.code(), "CONTRACT-004-NAME");
        let dup = PipelineValidationError::DuplicateStage {
            stage: "plan".into(),
            pipeline: "p".into(),
        };
        assert_eq!(dup.code(), "CONTRACT-004-DUPLICATE");
        assert_eq!(dup.to_string(), "Stage 'plan' is already part of pipeline 'p'");
    }

    #[test]
    fn test_validation_error_converts() {
        let err: PipelineError = PipelineValidationError::Empty.into();
        assert_eq!(err.to_string(), "Pipeline has no stages");
        assert_eq!(err.name(), "PipelineValidationError");
    }
}
