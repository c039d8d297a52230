//! HTTP front end for the sample store
//!
//! - `GET /api/data?start=&end=`: inclusive range query, JSON array
//! - `GET /api/stream?cadence=`: live tail as Server-Sent Events
//! - `GET /health`: store and subscriber snapshot
//! - everything else: static dashboard files

pub mod error;
pub mod params;
pub mod routes;
pub mod state;

pub use error::ServerError;
pub use routes::build_router;
pub use state::{AppState, StreamSettings};

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Bind the listener, mapping failure to a fatal startup error
pub async fn bind(addr: &str) -> Result<TcpListener, ServerError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })
}

/// Serve `router` until `shutdown` is cancelled
pub async fn serve(
    listener: TcpListener,
    router: axum::Router,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
        })
        .await
        .map_err(ServerError::Serve)
}
