//! The event relay.
//!
//! Bridges a run onto an output channel using a fixed event vocabulary:
//!
//! ```text
//! ready → progress* → (final | error)? → done
//! ```
//!
//! `ready` is written before any run work begins and `done` is attempted
//! exactly once on every path, after which the channel is closed. No
//! failure from the run escapes [`EventRelay::relay`]; it is reported as a
//! single `error` event instead.

mod channel;
mod failure;
mod frame;

pub use channel::{ChannelClosed, EventChannel, EventReceiver};
pub use failure::{describe_failure, FailureDescription};
pub use frame::{EventKind, OutwardEvent};

use crate::cancellation::CancellationToken;
use crate::core::Prompt;
use crate::errors::PipelineError;
use crate::pipeline::{PipelineRunner, RunHandle};
use crate::utils::generate_run_id;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};

fn default_channel_capacity() -> usize {
    32
}

/// Relay settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Frames buffered between the relay and a slow reader.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl RelayConfig {
    /// Sets the channel capacity.
    #[must_use]
    pub const fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }
}

/// How a relay ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// `final` was delivered.
    Completed,
    /// The run failed and `error` was written (or attempted).
    Failed(FailureDescription),
    /// The reader went away before the run finished.
    Disconnected,
}

/// Summary of one relay, for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySummary {
    /// The run identifier.
    pub run_id: String,
    /// How the relay ended.
    pub outcome: RelayOutcome,
    /// Number of `progress` events delivered.
    pub progress_events: usize,
}

impl RelaySummary {
    /// Returns true if the run's final result was delivered.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self.outcome, RelayOutcome::Completed)
    }
}

enum Drained {
    Result(serde_json::Value),
    Disconnected,
}

/// Runs prompts and streams their events onto output channels.
///
/// Shared by all requests; every call to [`relay`](Self::relay) owns its
/// run and channel.
pub struct EventRelay {
    runner: Arc<dyn PipelineRunner>,
    config: RelayConfig,
}

impl EventRelay {
    /// Creates a relay over a runner.
    #[must_use]
    pub fn new(runner: Arc<dyn PipelineRunner>) -> Self {
        Self {
            runner,
            config: RelayConfig::default(),
        }
    }

    /// Sets the relay settings.
    #[must_use]
    pub const fn with_config(mut self, config: RelayConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the relay settings.
    #[must_use]
    pub const fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Opens a channel sized by the configured capacity.
    #[must_use]
    pub fn open_channel(&self) -> (EventChannel, EventReceiver) {
        EventChannel::new(self.config.channel_capacity)
    }

    /// Relays one run for `prompt` onto `channel`, then closes the channel.
    pub async fn relay(&self, prompt: Prompt, channel: EventChannel) -> RelaySummary {
        let run_id = generate_run_id().to_string();
        let span = info_span!("relay", run_id = %run_id, prompt_chars = prompt.char_count());
        self.relay_run(run_id, prompt, channel).instrument(span).await
    }

    async fn relay_run(&self, run_id: String, prompt: Prompt, mut channel: EventChannel) -> RelaySummary {
        let cancel = Arc::new(CancellationToken::new());
        let mut progress_events = 0;

        let outcome = if channel.send(&OutwardEvent::ready()).await.is_err() {
            RelayOutcome::Disconnected
        } else {
            match self
                .drain(&run_id, prompt, &mut channel, &cancel, &mut progress_events)
                .await
            {
                Ok(Drained::Result(value)) => {
                    if channel.send(&OutwardEvent::final_result(value)).await.is_ok() {
                        RelayOutcome::Completed
                    } else {
                        RelayOutcome::Disconnected
                    }
                }
                Ok(Drained::Disconnected) => RelayOutcome::Disconnected,
                Err(err) => {
                    let failure = describe_failure(&err);
                    warn!(error = %err, name = ?failure.name, "Run failed");
                    cancel.cancel("run failed");
                    if channel.send(&OutwardEvent::error(&failure)).await.is_err() {
                        debug!("Could not deliver error event");
                    }
                    RelayOutcome::Failed(failure)
                }
            }
        };

        if outcome == RelayOutcome::Disconnected {
            info!(progress_events, "Client disconnected; cancelling run");
            cancel.cancel("client disconnected");
        }

        if channel.send(&OutwardEvent::done()).await.is_err() {
            debug!("Could not deliver done event");
        }
        channel.close();

        debug!(progress_events, outcome = ?outcome, "Relay finished");
        RelaySummary {
            run_id,
            outcome,
            progress_events,
        }
    }

    /// Starts the run, forwards every notification, then awaits the result.
    async fn drain(
        &self,
        run_id: &str,
        prompt: Prompt,
        channel: &mut EventChannel,
        cancel: &Arc<CancellationToken>,
        progress_events: &mut usize,
    ) -> Result<Drained, PipelineError> {
        let RunHandle {
            notifications,
            result,
            ..
        } = self.runner.start(run_id, prompt, Arc::clone(cancel)).await?;

        debug!(shape = ?notifications.shape(), "Run started");
        let mut events = notifications.into_stream();

        loop {
            let next = tokio::select! {
                biased;
                () = channel.closed() => return Ok(Drained::Disconnected),
                next = events.next() => next,
            };
            let Some(notification) = next else {
                break;
            };
            if channel.send(&OutwardEvent::progress(notification?)).await.is_err() {
                return Ok(Drained::Disconnected);
            }
            *progress_events += 1;
        }
        drop(events);

        Ok(Drained::Result(result.await?))
    }
}

impl fmt::Debug for EventRelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRelay")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
