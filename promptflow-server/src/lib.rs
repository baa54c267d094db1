//! # Promptflow Server
//!
//! HTTP transport for promptflow: a single run endpoint that streams the
//! plan, act, reflect pipeline as server-sent events, plus a liveness probe.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, missing_docs, rust_2018_idioms)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod config;
pub mod logging;
pub mod routes;

pub use config::{LogFormat, ServerConfig};
pub use routes::{build_router, AppState};

use promptflow::generation::build_generator;
use promptflow::pipeline::Pipeline;
use promptflow::relay::EventRelay;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Builds the shared handler state from configuration.
pub fn build_state(config: &ServerConfig) -> anyhow::Result<AppState> {
    let generator = build_generator(&config.generator_config())?;
    let pipeline = Pipeline::plan_act_reflect(generator, config.pipeline_config())?;
    let relay = EventRelay::new(Arc::new(pipeline)).with_config(config.relay_config());
    Ok(AppState::new(Arc::new(relay)))
}

/// Binds and serves until interrupted.
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let state = build_state(&config)?;
    let path = config.endpoint_path();
    let app = build_router(state, &path);

    let listener = TcpListener::bind(config.socket_addr()).await?;
    info!(
        addr = %listener.local_addr()?,
        path = %path,
        generator = %config.generator,
        context_policy = %config.context_policy,
        "Promptflow server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Promptflow server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until the process is killed.
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_build_state_from_defaults() {
        let config = ServerConfig::try_parse_from(["promptflow-server"]).unwrap();
        let state = build_state(&config).unwrap();
        assert_eq!(state.relay().config(), &config.relay_config());
    }

    #[test]
    fn test_build_state_tolerates_oversized_timeouts() {
        let config = ServerConfig::try_parse_from([
            "promptflow-server",
            "--generator-timeout-seconds",
            "1e30",
            "--stage-timeout-seconds",
            "1e30",
        ])
        .unwrap();
        assert!(build_state(&config).is_ok());
    }
}
