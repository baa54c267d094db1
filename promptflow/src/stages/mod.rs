//! Stage trait and implementations.
//!
//! Stages are the units of work a pipeline sequences. Each one turns the
//! run's prompt into a text artifact.

mod generation;

pub use generation::{GenerationStage, InstructionTemplate};

use crate::core::Prompt;
use crate::errors::PipelineError;
use async_trait::async_trait;
use std::fmt::Debug;

/// Output of the stage that ran immediately before the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviousOutput<'a> {
    /// Name of the previous stage.
    pub stage: &'a str,
    /// Its text output.
    pub output: &'a str,
}

/// Per-invocation context handed to a stage.
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    run_id: &'a str,
    stage_name: &'a str,
    prompt: &'a Prompt,
    previous: Option<PreviousOutput<'a>>,
}

impl<'a> StageContext<'a> {
    /// Creates a new stage context.
    #[must_use]
    pub fn new(run_id: &'a str, stage_name: &'a str, prompt: &'a Prompt) -> Self {
        Self {
            run_id,
            stage_name,
            prompt,
            previous: None,
        }
    }

    /// Attaches the previous stage's output.
    #[must_use]
    pub fn with_previous(mut self, previous: Option<PreviousOutput<'a>>) -> Self {
        self.previous = previous;
        self
    }

    /// Returns the run identifier.
    #[must_use]
    pub fn run_id(&self) -> &'a str {
        self.run_id
    }

    /// Returns the name of the stage being executed.
    #[must_use]
    pub fn stage_name(&self) -> &'a str {
        self.stage_name
    }

    /// Returns the run's prompt.
    #[must_use]
    pub fn prompt(&self) -> &'a Prompt {
        self.prompt
    }

    /// Returns the previous stage's output, when the context policy threads it.
    #[must_use]
    pub fn previous(&self) -> Option<PreviousOutput<'a>> {
        self.previous
    }
}

/// Trait for pipeline stages.
///
/// Stages are stateless and shared across runs.
#[async_trait]
pub trait Stage: Send + Sync + Debug {
    /// Returns the name of the stage.
    fn name(&self) -> &str;

    /// Executes the stage and returns its text artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying generation call fails.
    async fn execute(&self, ctx: &StageContext<'_>) -> Result<String, PipelineError>;
}
