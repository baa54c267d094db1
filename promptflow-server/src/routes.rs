//! HTTP routes: preflight, run submission, and liveness.

use axum::{
    body::{Body, Bytes},
    extract::{rejection::BytesRejection, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::StreamExt;
use promptflow::core::Prompt;
use promptflow::relay::EventRelay;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, info};

/// Methods accepted on the run endpoint.
pub const ALLOWED_METHODS: &str = "POST, OPTIONS";

/// Content type of the event stream.
pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream; charset=utf-8";

/// Shared handler state, built once at startup.
#[derive(Debug, Clone)]
pub struct AppState {
    relay: Arc<EventRelay>,
}

impl AppState {
    /// Creates the state around a relay.
    #[must_use]
    pub const fn new(relay: Arc<EventRelay>) -> Self {
        Self { relay }
    }

    /// Returns the relay.
    #[must_use]
    pub const fn relay(&self) -> &Arc<EventRelay> {
        &self.relay
    }
}

/// Builds the router with the run endpoint mounted at `path`.
pub fn build_router(state: AppState, path: &str) -> Router {
    Router::new()
        .route(
            path,
            post(submit).options(preflight).fallback(method_not_allowed),
        )
        .route("/healthz", get(healthz))
        .with_state(state)
}

fn cors_headers() -> [(HeaderName, &'static str); 3] {
    [
        (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type, Authorization"),
        (header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS),
    ]
}

async fn preflight() -> impl IntoResponse {
    (StatusCode::NO_CONTENT, cors_headers())
}

/// Streams a run for the posted prompt.
///
/// The body is parsed best-effort; anything unreadable becomes the empty
/// prompt. The relay runs on its own task and the response body is the
/// reading end of its channel.
async fn submit(State(state): State<AppState>, body: Result<Bytes, BytesRejection>) -> Response {
    let prompt = match body {
        Ok(bytes) => Prompt::from_body(&bytes),
        Err(rejection) => {
            debug!(%rejection, "Request body unreadable; using empty prompt");
            Prompt::default()
        }
    };

    let relay = Arc::clone(&state.relay);
    let (channel, receiver) = relay.open_channel();
    tokio::spawn(async move {
        let summary = relay.relay(prompt, channel).await;
        info!(
            run_id = %summary.run_id,
            outcome = ?summary.outcome,
            progress_events = summary.progress_events,
            "Run streamed"
        );
    });

    let stream = receiver.into_stream().map(Ok::<_, Infallible>);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, EVENT_STREAM_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache, no-transform"),
            (header::CONNECTION, "keep-alive"),
        ],
        cors_headers(),
        Body::from_stream(stream),
    )
        .into_response()
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, ALLOWED_METHODS)],
        cors_headers(),
        "Method Not Allowed",
    )
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
