//! Offline generation backend.

use super::TextGenerator;
use crate::errors::GenerationError;
use async_trait::async_trait;
use std::time::Duration;

const DEFAULT_MAX_CHARS: usize = 280;

/// A deterministic generator that echoes a normalized form of the instruction.
///
/// Used when no model backend is configured, and in tests and benches.
#[derive(Debug, Clone)]
pub struct EchoGenerator {
    max_chars: usize,
    latency: Duration,
}

impl Default for EchoGenerator {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            latency: Duration::ZERO,
        }
    }
}

impl EchoGenerator {
    /// Creates a new echo generator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of characters echoed back.
    #[must_use]
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars.max(1);
        self
    }

    /// Sets an artificial latency applied to every call.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn render(&self, instruction: &str) -> String {
        let collapsed = instruction.split_whitespace().collect::<Vec<_>>().join(" ");
        let mut text: String = collapsed.chars().take(self.max_chars).collect();
        if collapsed.chars().count() > self.max_chars {
            text.push_str("...");
        }
        format!("[echo] {text}")
    }
}

#[async_trait]
impl TextGenerator for EchoGenerator {
    async fn generate(&self, instruction: &str) -> Result<String, GenerationError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(self.render(instruction))
    }
}
