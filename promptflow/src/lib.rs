//! # Promptflow
//!
//! A plan, act, reflect generation pipeline with a streaming event relay.
//!
//! Promptflow runs a prompt through an ordered list of generation stages and
//! streams the run to a client as a fixed vocabulary of events:
//!
//! - **Stages**: each stage renders an instruction and calls a shared [`TextGenerator`](generation::TextGenerator)
//! - **Pipelines**: validated, immutable stage sequences with cancellation and timeouts
//! - **Event relay**: `ready`, `progress`, `final` or `error`, then always `done`
//! - **Failure containment**: nothing a run does escapes the relay unreported
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use promptflow::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), PipelineValidationError> {
//! let pipeline = Pipeline::plan_act_reflect(Arc::new(EchoGenerator::new()), PipelineConfig::new())?;
//! let relay = EventRelay::new(Arc::new(pipeline));
//!
//! let (channel, mut receiver) = relay.open_channel();
//! tokio::spawn(async move {
//!     relay.relay(Prompt::new("Write a haiku about autumn"), channel).await;
//! });
//!
//! while let Some(frame) = receiver.recv().await {
//!     print!("{}", String::from_utf8_lossy(&frame));
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod core;
pub mod errors;
pub mod events;
pub mod generation;
pub mod pipeline;
pub mod relay;
pub mod stages;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::core::{Prompt, RunOutput, StageEvent, StageRecord};
    pub use crate::errors::{
        GenerationError, PipelineError, PipelineValidationError,
        FALLBACK_ERROR_MESSAGE,
    };
    pub use crate::events::{ChannelEventSink, EventSink};
    pub use crate::generation::{
        build_generator, EchoGenerator, GeneratorBackend, GeneratorConfig, TextGenerator,
    };
    pub use crate::pipeline::{
        ContextPolicy, NotificationSource, Pipeline, PipelineBuilder, PipelineConfig,
        PipelineRunner, RunHandle,
    };
    pub use crate::relay::{
        EventChannel, EventKind, EventReceiver, EventRelay, OutwardEvent, RelayConfig,
        RelayOutcome, RelaySummary,
    };
    pub use crate::stages::{GenerationStage, InstructionTemplate, Stage, StageContext};
    pub use crate::utils::{generate_run_id, iso_timestamp};
}
