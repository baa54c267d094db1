//! Core domain model types for promptflow.
//!
//! This module contains the fundamental types used throughout the crate:
//! - The request prompt
//! - Progress notifications emitted by a run
//! - The aggregated run output

mod event;
mod output;
mod prompt;

pub use event::StageEvent;
pub use output::{RunOutput, StageRecord};
pub use prompt::Prompt;
