//! Test fixtures for relay and pipeline testing.

use std::sync::Arc;

use crate::core::Prompt;
use crate::errors::PipelineValidationError;
use crate::generation::{EchoGenerator, TextGenerator};
use crate::pipeline::{ContextPolicy, Pipeline, PipelineConfig};
use crate::relay::{EventReceiver, EventRelay};

/// One decoded `event:`/`data:` frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFrame {
    /// The event kind.
    pub kind: String,
    /// The decoded JSON payload.
    pub data: serde_json::Value,
}

/// Decodes a byte stream of frames.
///
/// Frames are separated by a blank line. Blocks without an `event:` line are
/// skipped, and a `data:` line that is not valid JSON decodes to its raw text.
#[must_use]
pub fn parse_frames(bytes: &[u8]) -> Vec<ParsedFrame> {
    let text = String::from_utf8_lossy(bytes);
    text.split("\n\n")
        .filter_map(|block| {
            let mut kind = None;
            let mut data = None;
            for line in block.lines() {
                if let Some(value) = line.strip_prefix("event:") {
                    kind = Some(value.trim().to_string());
                } else if let Some(value) = line.strip_prefix("data:") {
                    let value = value.trim();
                    data = Some(
                        serde_json::from_str(value)
                            .unwrap_or_else(|_| serde_json::Value::String(value.to_string())),
                    );
                }
            }
            kind.map(|kind| ParsedFrame {
                kind,
                data: data.unwrap_or(serde_json::Value::Null),
            })
        })
        .collect()
}

/// Reads a receiver to completion and decodes every frame.
pub async fn collect_frames(mut receiver: EventReceiver) -> Vec<ParsedFrame> {
    let mut bytes = Vec::new();
    while let Some(frame) = receiver.recv().await {
        bytes.extend_from_slice(&frame);
    }
    parse_frames(&bytes)
}

/// Returns the kinds of the frames, in order.
#[must_use]
pub fn event_kinds(frames: &[ParsedFrame]) -> Vec<String> {
    frames.iter().map(|f| f.kind.clone()).collect()
}

/// The prompt used throughout the examples in the docs.
#[must_use]
pub fn haiku_prompt() -> Prompt {
    Prompt::new("Write a haiku about autumn")
}

/// A relay over the plan, act, reflect pipeline with the given generator.
///
/// # Errors
///
/// Returns an error if the pipeline fails validation.
pub fn pipeline_relay(
    generator: Arc<dyn TextGenerator>,
    policy: ContextPolicy,
) -> Result<EventRelay, PipelineValidationError> {
    let config = PipelineConfig::new().with_context_policy(policy);
    let pipeline = Pipeline::plan_act_reflect(generator, config)?;
    Ok(EventRelay::new(Arc::new(pipeline)))
}

/// A relay over the offline echo generator.
///
/// # Errors
///
/// Returns an error if the pipeline fails validation.
pub fn echo_relay() -> Result<EventRelay, PipelineValidationError> {
    pipeline_relay(Arc::new(EchoGenerator::new()), ContextPolicy::default())
}
