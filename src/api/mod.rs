//! HTTP endpoint exposing the bridge's own counters.
//!
//! - `GET /metrics` renders the Prometheus text exposition format.
//! - `GET /health` returns a small JSON status document.

use crate::core::{BridgeError, Result};
use crate::telemetry::Telemetry;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
struct ApiState {
    telemetry: Arc<Telemetry>,
    started: Instant,
}

/// Health check response.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_seconds: u64,
}

/// Build the router serving the telemetry endpoints.
pub fn router(telemetry: Arc<Telemetry>) -> Router {
    let state = ApiState {
        telemetry,
        started: Instant::now(),
    };

    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the telemetry listener. Failing to bind is fatal at startup.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr).await.map_err(|e| {
        BridgeError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to bind telemetry endpoint to {}: {}", addr, e),
        ))
    })
}

/// Serve the telemetry endpoints until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, telemetry: Arc<Telemetry>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Serving telemetry on http://{}/metrics", addr);
    }

    axum::serve(listener, router(telemetry))
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

/// GET /metrics - Outcome counters in text exposition format
async fn metrics_handler(State(state): State<ApiState>) -> impl IntoResponse {
    match state.telemetry.encode() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode telemetry");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        },
    }
}

/// GET /health - Liveness and uptime
async fn health_handler(State(state): State<ApiState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.started.elapsed().as_secs(),
    })
}
