//! HTTP status endpoint.
//!
//! Serves a small axum router alongside the WebSocket listener so operators
//! and load balancers can poll server health without opening a tracking
//! session.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracker_server::connection::SessionManager;

/// Response body for `GET /api/status`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Fixed "ok" marker
    pub status: &'static str,
    /// Number of admitted sessions currently connected
    pub active_sessions: usize,
    /// Package version
    pub version: &'static str,
}

/// Builds the status router.
pub fn build_router(session_manager: Arc<SessionManager>) -> Router {
    Router::new()
        .route("/api/status", get(status_handler))
        .with_state(session_manager)
}

/// GET /api/status
async fn status_handler(
    State(session_manager): State<Arc<SessionManager>>,
) -> Json<StatusResponse> {
    let active_sessions = session_manager.session_count().await;
    Json(StatusResponse {
        status: "ok",
        active_sessions,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Binds and serves the status endpoint until the process exits.
pub async fn serve_status(
    addr: SocketAddr,
    session_manager: Arc<SessionManager>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let router = build_router(session_manager);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("📊 Status endpoint listening on http://{addr}/api/status");
    axum::serve(listener, router).await?;
    Ok(())
}
