//! Axum HTTP channel — the relay's only inbound surface.
//!
//! ## URL layout
//!
//! ```text
//! POST /ask         — forward a question, block until the answer
//! POST /submitName  — echo a name back (input validation demo endpoint)
//! GET  /api/health  — liveness probe
//! GET  /favicon.ico — 204
//! GET  /            — root HTML greeting
//! ```
//!
//! CORS is permissive on every route. Shutdown is wired to a
//! [`CancellationToken`] via axum's graceful shutdown.

mod api;
mod ui;

use std::sync::Arc;

use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::error::AppError;
use crate::relay::RelayService;

// ── Shared request state ──────────────────────────────────────────────────────

/// Router state injected into every handler via [`axum::extract::State`].
///
/// Cheap to clone — all fields are reference-counted.
#[derive(Clone)]
pub struct AppState {
    /// Bot name shown on the root page and in log lines.
    pub bot_name: Arc<str>,
    pub relay: Arc<RelayService>,
}

// ── Router ────────────────────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ask", post(api::ask))
        .route("/submitName", post(api::submit_name))
        .route("/api/health", get(api::health))
        .route("/favicon.ico", get(|| async { StatusCode::NO_CONTENT }))
        .route("/", get(ui::root))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Server loop ───────────────────────────────────────────────────────────────

pub async fn serve(
    bind_addr: &str,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let bot_name = state.bot_name.clone();
    let app = router(state);

    let listener = TcpListener::bind(bind_addr)
        .await
        .map_err(|e| AppError::Http(format!("bind failed on {bind_addr}: {e}")))?;

    info!(%bot_name, %bind_addr, "http channel listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::Http(format!("server error: {e}")))?;

    info!(%bot_name, "http channel shut down");
    Ok(())
}
