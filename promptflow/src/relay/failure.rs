//! Best-effort failure descriptions for `error` events.

use crate::errors::{GenerationError, PipelineError, FALLBACK_ERROR_MESSAGE};
use serde::{Deserialize, Serialize};
use std::error::Error;

/// The payload of an `error` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDescription {
    /// Never empty.
    pub message: String,
    /// Error class name, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl FailureDescription {
    /// Creates a description, substituting the fallback for a blank message.
    #[must_use]
    pub fn new(message: impl Into<String>, name: Option<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            FALLBACK_ERROR_MESSAGE.to_string()
        } else {
            message
        };
        Self {
            message,
            name: name.filter(|n| !n.trim().is_empty()),
        }
    }
}

/// Describes any error for the client.
///
/// Generation failures report their own message and name. Pipeline errors
/// report their display text and kind name. Anything else reports its
/// display text with no name.
#[must_use]
pub fn describe_failure(err: &(dyn Error + 'static)) -> FailureDescription {
    if let Some(err) = err.downcast_ref::<PipelineError>() {
        return describe_pipeline_error(err);
    }
    if let Some(err) = err.downcast_ref::<GenerationError>() {
        return describe_generation_error(err);
    }
    FailureDescription::new(err.to_string(), None)
}

fn describe_pipeline_error(err: &PipelineError) -> FailureDescription {
    match err {
        PipelineError::Stage { source, .. } => describe_generation_error(source),
        PipelineError::Notifications(message) | PipelineError::Aborted(message) => {
            FailureDescription::new(message.clone(), Some(err.name().to_string()))
        }
        _ => FailureDescription::new(err.to_string(), Some(err.name().to_string())),
    }
}

fn describe_generation_error(err: &GenerationError) -> FailureDescription {
    FailureDescription::new(err.message.clone().unwrap_or_default(), err.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Opaque;

    impl fmt::Display for Opaque {
        fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
            Ok(())
        }
    }

    impl Error for Opaque {}

    #[test]
    fn test_stage_failure_uses_generation_fields() {
        let err = PipelineError::stage("act", GenerationError::new("rate limited").with_name("HttpError"));
        let failure = describe_failure(&err);
        assert_eq!(failure.message, "rate limited");
        assert_eq!(failure.name.as_deref(), Some("HttpError"));
    }

    #[test]
    fn test_anonymous_generation_failure_falls_back() {
        let err = PipelineError::stage("plan", GenerationError::anonymous());
        let failure = describe_failure(&err);
        assert_eq!(failure.message, FALLBACK_ERROR_MESSAGE);
        assert!(failure.name.is_none());
    }

    #[test]
    fn test_notification_failure_reports_inner_message() {
        let err = PipelineError::Notifications("notification source is not iterable".into());
        let failure = describe_failure(&err);
        assert_eq!(failure.message, "notification source is not iterable");
        assert_eq!(failure.name.as_deref(), Some("NotificationError"));
    }

    #[test]
    fn test_timeout_names_stage() {
        let err = PipelineError::Timeout {
            stage: "reflect".into(),
            timeout_seconds: 2.0,
        };
        let failure = describe_failure(&err);
        assert!(failure.message.contains("reflect"));
        assert_eq!(failure.name.as_deref(), Some("TimeoutError"));
    }

    #[test]
    fn test_foreign_error_without_text_falls_back() {
        let failure = describe_failure(&Opaque);
        assert_eq!(failure.message, FALLBACK_ERROR_MESSAGE);
        assert!(failure.name.is_none());
    }

    #[test]
    fn test_blank_name_is_dropped() {
        let failure = FailureDescription::new("x", Some("  ".into()));
        assert!(failure.name.is_none());
    }
}
