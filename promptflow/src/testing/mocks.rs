//! Mock generators and runners for testing.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::cancellation::CancellationToken;
use crate::core::Prompt;
use crate::errors::{GenerationError, PipelineError};
use crate::generation::TextGenerator;
use crate::pipeline::{
    NotificationEnvelope, NotificationSource, PipelineRunner, RunHandle, SourceShape,
};

/// A generator that replays a fixed script of replies.
///
/// Calls beyond the end of the script fail.
#[derive(Debug)]
pub struct ScriptedGenerator {
    replies: Vec<Result<String, GenerationError>>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    /// Creates a generator that returns `replies` in order.
    #[must_use]
    pub fn new(replies: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            replies,
            calls: AtomicUsize::new(0),
        }
    }

    /// Creates a generator that always succeeds with the given texts.
    #[must_use]
    pub fn replying(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok((*t).to_string())).collect())
    }

    /// Returns the number of calls made.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, _instruction: &str) -> Result<String, GenerationError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .get(index)
            .cloned()
            .unwrap_or_else(|| Err(GenerationError::new("script exhausted")))
    }
}

/// A generator that fails on one specific call (1-based) and succeeds otherwise.
#[derive(Debug)]
pub struct FailingOnCallGenerator {
    fail_on: usize,
    error: GenerationError,
    calls: AtomicUsize,
}

impl FailingOnCallGenerator {
    /// Creates a generator that returns `error` on call number `fail_on`.
    #[must_use]
    pub fn new(fail_on: usize, error: GenerationError) -> Self {
        Self {
            fail_on,
            error,
            calls: AtomicUsize::new(0),
        }
    }

    /// Returns the number of calls made.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for FailingOnCallGenerator {
    async fn generate(&self, _instruction: &str) -> Result<String, GenerationError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on {
            Err(self.error.clone())
        } else {
            Ok(format!("output {call}"))
        }
    }
}

/// A generator that panics on every call.
#[derive(Debug)]
pub struct PanickingGenerator {
    message: String,
}

impl PanickingGenerator {
    /// Creates a generator that panics with `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for PanickingGenerator {
    async fn generate(&self, _instruction: &str) -> Result<String, GenerationError> {
        panic!("{}", self.message);
    }
}

/// A generator that records every instruction and replies `reply N`.
#[derive(Debug, Default)]
pub struct RecordingGenerator {
    instructions: Mutex<Vec<String>>,
    latency: Duration,
}

impl RecordingGenerator {
    /// Creates a new recording generator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits this long before replying.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Returns the recorded instructions.
    #[must_use]
    pub fn instructions(&self) -> Vec<String> {
        self.instructions.lock().clone()
    }

    /// Returns the number of calls made.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.instructions.lock().len()
    }
}

#[async_trait]
impl TextGenerator for RecordingGenerator {
    async fn generate(&self, instruction: &str) -> Result<String, GenerationError> {
        let call = {
            let mut instructions = self.instructions.lock();
            instructions.push(instruction.to_string());
            instructions.len()
        };
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(format!("reply {call}"))
    }
}

/// A runner that replays fixed notifications and a fixed result.
///
/// Lets relay behavior be tested against every notification shape without
/// a real pipeline.
#[derive(Debug)]
pub struct ScriptedRunner {
    notifications: Vec<serde_json::Value>,
    result: Result<serde_json::Value, PipelineError>,
    shape: SourceShape,
    missing_events: bool,
    fail_after: Option<(usize, PipelineError)>,
    start_error: Option<PipelineError>,
    starts: Arc<AtomicUsize>,
}

impl ScriptedRunner {
    /// Creates a runner with wrapped notifications.
    #[must_use]
    pub fn new(
        notifications: Vec<serde_json::Value>,
        result: Result<serde_json::Value, PipelineError>,
    ) -> Self {
        Self {
            notifications,
            result,
            shape: SourceShape::Wrapped,
            missing_events: false,
            fail_after: None,
            start_error: None,
            starts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Selects the notification shape.
    #[must_use]
    pub fn with_shape(mut self, shape: SourceShape) -> Self {
        self.shape = shape;
        self
    }

    /// Returns an envelope whose `events` field is absent.
    #[must_use]
    pub fn without_events(mut self) -> Self {
        self.missing_events = true;
        self
    }

    /// Fails the notification sequence after `count` items.
    #[must_use]
    pub fn failing_after(mut self, count: usize, error: PipelineError) -> Self {
        self.fail_after = Some((count, error));
        self
    }

    /// Fails `start` itself.
    #[must_use]
    pub fn failing_to_start(mut self, error: PipelineError) -> Self {
        self.start_error = Some(error);
        self
    }

    /// Shared counter of `start` calls.
    #[must_use]
    pub fn start_count(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.starts)
    }
}

#[async_trait]
impl PipelineRunner for ScriptedRunner {
    async fn start(
        &self,
        run_id: &str,
        _prompt: Prompt,
        _cancel: Arc<CancellationToken>,
    ) -> Result<RunHandle, PipelineError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.start_error {
            return Err(err.clone());
        }

        let mut items: Vec<Result<serde_json::Value, PipelineError>> =
            self.notifications.iter().cloned().map(Ok).collect();
        if let Some((count, err)) = &self.fail_after {
            items.truncate(*count);
            items.push(Err(err.clone()));
        }
        let events = stream::iter(items).boxed();

        let notifications = if self.missing_events {
            NotificationSource::Wrapped(NotificationEnvelope::empty())
        } else {
            match self.shape {
                SourceShape::Wrapped => NotificationSource::wrapped(events),
                SourceShape::Bare => NotificationSource::bare(events),
            }
        };

        let result = self.result.clone();
        Ok(RunHandle::new(
            run_id,
            notifications,
            async move { result }.boxed(),
        ))
    }
}
