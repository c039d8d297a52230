//! Route handlers
//!
//! Query, live-tail and health routes share one [`AppState`]. Paths outside
//! those fall through to the static dashboard directory.

use std::path::Path;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::{Json, Router};
use futures::{Stream, StreamExt};
use sensorstream_core::Sample;
use sensorstream_streaming::StoreStats;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::params::{QueryPairs, RangeParams, StreamParams};
use crate::state::AppState;

/// SSE event name carried by every live-tail message
pub const SAMPLE_EVENT: &str = "sample";

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub store: StoreStats,
    pub subscribers: usize,
}

/// Build the complete router: API routes, static fallback, CORS and tracing
pub fn build_router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes())
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/data", get(query_range))
        .route("/stream", get(live_tail))
}

/// GET /api/data: retained samples within the optional inclusive bounds
async fn query_range(
    State(state): State<AppState>,
    Query(pairs): Query<QueryPairs>,
) -> Json<Vec<Arc<Sample>>> {
    let (start, end) = RangeParams::from_pairs(&pairs).bounds();
    let samples = state.reader.query(start, end);
    tracing::trace!(?start, ?end, count = samples.len(), "range query");
    Json(samples)
}

/// GET /api/stream: latest sample pushed at the requested cadence
///
/// The subscription lives as long as the response body. When the client
/// goes away the body is dropped, which drops the tail and unsubscribes.
async fn live_tail(
    State(state): State<AppState>,
    Query(pairs): Query<QueryPairs>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let settings = state.stream;
    let cadence = StreamParams::from_pairs(&pairs)
        .cadence(settings.default_cadence, settings.min_cadence);
    let (handle, tail) = state.hub.subscribe(cadence);

    tracing::info!(
        id = %handle.id(),
        cadence_ms = cadence.as_millis() as u64,
        subscribers = state.hub.active_count(),
        "live tail opened"
    );

    let events = tail
        .into_stream()
        .map(|sample| Event::default().event(SAMPLE_EVENT).json_data(&*sample));

    Sse::new(events).keep_alive(KeepAlive::new().interval(settings.keep_alive))
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.uptime_secs(),
        store: state.reader.stats(),
        subscribers: state.hub.active_count(),
    })
}
