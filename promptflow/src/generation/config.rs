//! Configuration for the generation backend.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Which generation backend to construct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeneratorBackend {
    /// Offline deterministic backend.
    #[default]
    #[serde(rename = "echo")]
    Echo,
    /// OpenAI-compatible chat completions endpoint.
    #[serde(rename = "openai")]
    OpenAi,
}

impl fmt::Display for GeneratorBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Echo => write!(f, "echo"),
            Self::OpenAi => write!(f, "openai"),
        }
    }
}

impl FromStr for GeneratorBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "echo" => Ok(Self::Echo),
            "openai" | "open_ai" => Ok(Self::OpenAi),
            other => Err(format!("unknown generator backend '{other}' (expected 'echo' or 'openai')")),
        }
    }
}

/// Configuration for the generation capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Backend to use.
    #[serde(default)]
    pub backend: GeneratorBackend,
    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// API key sent as a bearer token.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: f64,
    /// Sampling temperature.
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Artificial latency for the echo backend, in milliseconds.
    #[serde(default)]
    pub echo_latency_ms: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout() -> f64 {
    60.0
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            backend: GeneratorBackend::default(),
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            timeout_seconds: default_timeout(),
            temperature: None,
            echo_latency_ms: 0,
        }
    }
}

impl GeneratorConfig {
    /// Creates a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the backend.
    #[must_use]
    pub fn with_backend(mut self, backend: GeneratorBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Gets the timeout as a `Duration`.
    ///
    /// Values that are not positive, or too large for a `Duration`, fall back
    /// to the default.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Some(self.timeout_seconds)
            .filter(|s| *s > 0.0)
            .and_then(|s| Duration::try_from_secs_f64(s).ok())
            .unwrap_or_else(|| Duration::from_secs_f64(default_timeout()))
    }

    /// Gets the echo latency as a `Duration`.
    #[must_use]
    pub fn echo_latency(&self) -> Duration {
        Duration::from_millis(self.echo_latency_ms)
    }

    /// Returns the chat completions endpoint URL.
    #[must_use]
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::default();
        assert_eq!(config.backend, GeneratorBackend::Echo);
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_completions_url_trims_slash() {
        let config = GeneratorConfig::new().with_base_url("http://localhost:8000/v1/");
        assert_eq!(config.completions_url(), "http://localhost:8000/v1/chat/completions");
    }

    #[test]
    fn test_invalid_timeout_falls_back() {
        let config = GeneratorConfig::new().with_timeout(-1.0);
        assert_eq!(config.timeout(), Duration::from_secs(60));

        let config = GeneratorConfig::new().with_timeout(f64::NAN);
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_oversized_timeout_falls_back() {
        let config = GeneratorConfig::new().with_timeout(1e30);
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("echo".parse::<GeneratorBackend>(), Ok(GeneratorBackend::Echo));
        assert_eq!("OpenAI".parse::<GeneratorBackend>(), Ok(GeneratorBackend::OpenAi));
        assert!("llama".parse::<GeneratorBackend>().is_err());
    }

    #[test]
    fn test_api_key_not_serialized() {
        let config = GeneratorConfig::new().with_api_key("sk-secret");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-secret"));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: GeneratorConfig = serde_json::from_str(r#"{"backend": "openai"}"#).unwrap();
        assert_eq!(config.backend, GeneratorBackend::OpenAi);
        assert_eq!(config.model, "gpt-4o-mini");
    }
}
