//! HTTP server for Tandem.
//!
//! Endpoints:
//! - `POST /chat` — run one message in a session; the response body is a
//!   newline-delimited stream of typed events, always terminated by exactly
//!   one `stream_complete`.
//! - `POST /approvals` — resolve a pending approval (200 / 404 / 410).
//! - `GET /plan/:session_id` — read-only plan snapshot.
//!
//! Per-session graph transitions are serialized through the shared
//! [`SessionRegistry`]; a client disconnect cancels the run at the next
//! checkpoint boundary.

mod app;
mod approvals;
mod chat;
mod plan;

pub use app::{AppState, RunConfigDefaults};
pub use chat::ChatRequest;

use axum::routing::{get, post};
use axum::Router;

/// Builds the router over shared state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(chat::chat))
        .route("/approvals", post(approvals::resolve))
        .route("/plan/:session_id", get(plan::snapshot))
        .with_state(state)
}

/// Binds and serves until the process is stopped.
pub async fn serve(addr: &str, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "tandem server listening");
    axum::serve(listener, build_router(state)).await
}
