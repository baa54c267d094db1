//! Testing utilities for promptflow pipelines and relays.
//!
//! This module provides:
//! - Mock generators and a scripted pipeline runner
//! - Frame decoding and relay fixtures
//! - Assertions over relayed event streams

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_completed, assert_event_kinds, assert_failed_with, assert_well_formed};
pub use fixtures::{
    collect_frames, echo_relay, event_kinds, haiku_prompt, parse_frames, pipeline_relay,
    ParsedFrame,
};
pub use mocks::{
    FailingOnCallGenerator, PanickingGenerator, RecordingGenerator, ScriptedGenerator,
    ScriptedRunner,
};
