//! Pipeline building and execution.
//!
//! This module provides:
//! - [`PipelineBuilder`] with validation
//! - Sequential execution with cancellation and per-stage timeouts
//! - [`PipelineRunner`] and the [`RunHandle`] a started run exposes

mod builder;
mod config;
mod executor;
mod run;

pub use builder::PipelineBuilder;
pub use config::{ContextPolicy, PipelineConfig};
pub use executor::{Pipeline, PLAN_ACT_REFLECT};
pub use run::{
    Notification, NotificationEnvelope, NotificationSource, NotificationStream, PipelineRunner,
    RunHandle, RunResult, SourceShape,
};
