//! Server configuration from command-line flags and environment variables.

use clap::{Parser, ValueEnum};
use promptflow::generation::{GeneratorBackend, GeneratorConfig};
use promptflow::pipeline::{ContextPolicy, PipelineConfig};
use promptflow::relay::RelayConfig;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Configuration for the promptflow server.
///
/// Every flag can also be set through its environment variable; a `.env`
/// file in the working directory is loaded first when present.
#[derive(Debug, Clone, Parser)]
#[command(name = "promptflow-server", version, about = "Streams plan, act, reflect runs as server-sent events")]
pub struct ServerConfig {
    /// Address to bind.
    #[arg(long, env = "PROMPTFLOW_HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    /// Port to bind.
    #[arg(short, long, env = "PROMPTFLOW_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Path of the run endpoint.
    #[arg(long, env = "PROMPTFLOW_PATH", default_value = "/api/run")]
    pub path: String,

    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, env = "PROMPTFLOW_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format.
    #[arg(long, env = "PROMPTFLOW_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Generation backend (`echo` or `openai`).
    #[arg(long, env = "PROMPTFLOW_GENERATOR", default_value_t = GeneratorBackend::Echo)]
    pub generator: GeneratorBackend,

    /// Base URL of the OpenAI-compatible API.
    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub openai_base_url: String,

    /// Model name sent to the OpenAI-compatible API.
    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-4o-mini")]
    pub openai_model: String,

    /// API key for the OpenAI-compatible API.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Request timeout for generation calls, in seconds.
    #[arg(long, env = "PROMPTFLOW_GENERATOR_TIMEOUT", default_value_t = 60.0)]
    pub generator_timeout_seconds: f64,

    /// Sampling temperature.
    #[arg(long, env = "PROMPTFLOW_TEMPERATURE")]
    pub temperature: Option<f32>,

    /// Whether each stage sees the previous stage's output (`isolated` or `threaded`).
    #[arg(long, env = "PROMPTFLOW_CONTEXT_POLICY", default_value_t = ContextPolicy::Isolated)]
    pub context_policy: ContextPolicy,

    /// Per-stage time limit in seconds.
    #[arg(long, env = "PROMPTFLOW_STAGE_TIMEOUT")]
    pub stage_timeout_seconds: Option<f64>,

    /// Frames buffered per connection before the relay waits on the client.
    #[arg(long, env = "PROMPTFLOW_CHANNEL_CAPACITY", default_value_t = 32)]
    pub channel_capacity: usize,
}

impl ServerConfig {
    /// Returns the address to bind.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns the endpoint path, always with a leading slash.
    #[must_use]
    pub fn endpoint_path(&self) -> String {
        let trimmed = self.path.trim();
        if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        }
    }

    /// Generation settings.
    #[must_use]
    pub fn generator_config(&self) -> GeneratorConfig {
        let mut config = GeneratorConfig::new()
            .with_backend(self.generator)
            .with_base_url(self.openai_base_url.clone())
            .with_model(self.openai_model.clone())
            .with_timeout(self.generator_timeout_seconds);
        if let Some(key) = &self.openai_api_key {
            config = config.with_api_key(key.clone());
        }
        config.temperature = self.temperature;
        config
    }

    /// Pipeline settings.
    #[must_use]
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::new()
            .with_context_policy(self.context_policy)
            .with_stage_timeout_seconds(self.stage_timeout_seconds)
    }

    /// Relay settings.
    #[must_use]
    pub const fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            channel_capacity: self.channel_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::try_parse_from(["promptflow-server"]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.endpoint_path(), "/api/run");
        assert_eq!(config.generator, GeneratorBackend::Echo);
        assert_eq!(config.context_policy, ContextPolicy::Isolated);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = ServerConfig::try_parse_from([
            "promptflow-server",
            "--port",
            "9000",
            "--path",
            "stream",
            "--generator",
            "openai",
            "--context-policy",
            "threaded",
            "--stage-timeout-seconds",
            "2.5",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(config.socket_addr().port(), 9000);
        assert_eq!(config.endpoint_path(), "/stream");
        assert_eq!(config.generator_config().backend, GeneratorBackend::OpenAi);
        assert_eq!(config.pipeline_config().context_policy, ContextPolicy::Threaded);
        assert_eq!(config.pipeline_config().stage_timeout_seconds, Some(2.5));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_policy_is_rejected() {
        let result = ServerConfig::try_parse_from(["promptflow-server", "--context-policy", "chained"]);
        assert!(result.is_err());
    }
}
