//! The text-generation capability consumed by pipeline stages.
//!
//! This module provides:
//! - The [`TextGenerator`] trait every backend implements
//! - An offline, deterministic [`EchoGenerator`]
//! - An OpenAI-compatible HTTP backend (feature `openai`)
//! - [`GeneratorConfig`] and [`build_generator`] for constructing one at startup

mod config;
mod echo;
#[cfg(feature = "openai")]
mod openai;

pub use config::{GeneratorBackend, GeneratorConfig};
pub use echo::EchoGenerator;
#[cfg(feature = "openai")]
pub use openai::OpenAiGenerator;

use crate::errors::GenerationError;
use async_trait::async_trait;
use std::sync::Arc;

/// Asynchronously turns an instruction into a text completion.
///
/// Implementations are shared across all concurrent runs and must not keep
/// per-run state. Dropping the returned future abandons the call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generates a completion for the instruction.
    async fn generate(&self, instruction: &str) -> Result<String, GenerationError>;
}

/// Builds the configured generation backend.
///
/// # Errors
///
/// Returns an error if the backend cannot be constructed (missing feature,
/// invalid HTTP client settings).
pub fn build_generator(config: &GeneratorConfig) -> Result<Arc<dyn TextGenerator>, GenerationError> {
    match config.backend {
        GeneratorBackend::Echo => Ok(Arc::new(EchoGenerator::new().with_latency(config.echo_latency()))),
        #[cfg(feature = "openai")]
        GeneratorBackend::OpenAi => Ok(Arc::new(OpenAiGenerator::new(config)?)),
        #[cfg(not(feature = "openai"))]
        GeneratorBackend::OpenAi => Err(GenerationError::new(
            "the openai backend requires the `openai` feature",
        )
        .with_name("ConfigError")),
    }
}
