//! Handles for in-flight runs.
//!
//! A started run exposes two things: an ordered sequence of progress
//! notifications and a final result that settles once the run is over.
//! Runners report notifications in one of two shapes, modelled by
//! [`NotificationSource`]; consumers normalize with
//! [`NotificationSource::into_stream`] and never care which one they got.

use crate::cancellation::CancellationToken;
use crate::core::Prompt;
use crate::errors::PipelineError;
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::stream::{self, BoxStream, StreamExt};
use std::fmt;
use std::sync::Arc;

/// A single opaque progress notification.
pub type Notification = serde_json::Value;

/// An ordered, possibly failing sequence of notifications.
pub type NotificationStream = BoxStream<'static, Result<Notification, PipelineError>>;

/// The eventual outcome of a run.
pub type RunResult = BoxFuture<'static, Result<serde_json::Value, PipelineError>>;

/// A container that carries the notification sequence in its `events` field.
#[derive(Default)]
pub struct NotificationEnvelope {
    /// The wrapped sequence, if the runner supplied one.
    pub events: Option<NotificationStream>,
}

impl NotificationEnvelope {
    /// Wraps a notification sequence.
    #[must_use]
    pub fn new(events: NotificationStream) -> Self {
        Self {
            events: Some(events),
        }
    }

    /// An envelope without a sequence.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

impl fmt::Debug for NotificationEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationEnvelope")
            .field("has_events", &self.events.is_some())
            .finish()
    }
}

/// Which shape a runner used for its notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceShape {
    /// The sequence sits inside an envelope.
    Wrapped,
    /// The sequence was returned directly.
    Bare,
}

/// The notification sequence of a run, in either shape a runner may use.
pub enum NotificationSource {
    /// An envelope holding the sequence.
    Wrapped(NotificationEnvelope),
    /// The sequence itself.
    Bare(NotificationStream),
}

impl NotificationSource {
    /// Wraps a sequence in an envelope.
    #[must_use]
    pub fn wrapped(events: NotificationStream) -> Self {
        Self::Wrapped(NotificationEnvelope::new(events))
    }

    /// Uses a sequence directly.
    #[must_use]
    pub fn bare(events: NotificationStream) -> Self {
        Self::Bare(events)
    }

    /// Returns the shape of this source.
    #[must_use]
    pub const fn shape(&self) -> SourceShape {
        match self {
            Self::Wrapped(_) => SourceShape::Wrapped,
            Self::Bare(_) => SourceShape::Bare,
        }
    }

    /// Normalizes either shape into one sequence.
    ///
    /// An envelope with no sequence yields a single failure.
    #[must_use]
    pub fn into_stream(self) -> NotificationStream {
        match self {
            Self::Bare(events) | Self::Wrapped(NotificationEnvelope { events: Some(events) }) => events,
            Self::Wrapped(NotificationEnvelope { events: None }) => stream::once(async {
                Err(PipelineError::Notifications(
                    "notification source is not iterable".to_string(),
                ))
            })
            .boxed(),
        }
    }
}

impl fmt::Debug for NotificationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wrapped(envelope) => f.debug_tuple("Wrapped").field(envelope).finish(),
            Self::Bare(_) => f.debug_tuple("Bare").field(&"<stream>").finish(),
        }
    }
}

/// A started run.
pub struct RunHandle {
    /// The run identifier.
    pub run_id: String,
    /// Progress notifications, in emission order.
    pub notifications: NotificationSource,
    /// The final result.
    pub result: RunResult,
}

impl RunHandle {
    /// Creates a new run handle.
    #[must_use]
    pub fn new(run_id: impl Into<String>, notifications: NotificationSource, result: RunResult) -> Self {
        Self {
            run_id: run_id.into(),
            notifications,
            result,
        }
    }
}

impl fmt::Debug for RunHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunHandle")
            .field("run_id", &self.run_id)
            .field("notifications", &self.notifications)
            .finish_non_exhaustive()
    }
}

/// Starts runs for a prompt.
///
/// The relay depends only on this trait, so any pipeline (or a scripted
/// stand-in) can sit behind it.
#[async_trait]
pub trait PipelineRunner: Send + Sync {
    /// Starts a run.
    ///
    /// The run must stop promptly once `cancel` is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if the run cannot be started at all.
    async fn start(
        &self,
        run_id: &str,
        prompt: Prompt,
        cancel: Arc<CancellationToken>,
    ) -> Result<RunHandle, PipelineError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> NotificationStream {
        stream::iter(vec![Ok(json!({"n": 1})), Ok(json!({"n": 2}))]).boxed()
    }

    #[tokio::test]
    async fn test_bare_and_wrapped_normalize_identically() {
        let bare: Vec<_> = NotificationSource::bare(sample())
            .into_stream()
            .map(|r| r.unwrap())
            .collect()
            .await;
        let wrapped: Vec<_> = NotificationSource::wrapped(sample())
            .into_stream()
            .map(|r| r.unwrap())
            .collect()
            .await;

        assert_eq!(bare, wrapped);
        assert_eq!(bare, vec![json!({"n": 1}), json!({"n": 2})]);
    }

    #[tokio::test]
    async fn test_empty_envelope_yields_single_failure() {
        let items: Vec<_> = NotificationSource::Wrapped(NotificationEnvelope::empty())
            .into_stream()
            .collect()
            .await;

        assert_eq!(items.len(), 1);
        match &items[0] {
            Err(PipelineError::Notifications(message)) => {
                assert_eq!(message, "notification source is not iterable");
            }
            other => panic!("unexpected item: {other:?}"),
        }
    }

    #[test]
    fn test_shape() {
        assert_eq!(NotificationSource::bare(sample()).shape(), SourceShape::Bare);
        assert_eq!(NotificationSource::wrapped(sample()).shape(), SourceShape::Wrapped);
    }
}
