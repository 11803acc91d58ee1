//! Axum handlers for the relay endpoints.
//!
//! Each handler receives [`AppState`] via [`axum::extract::State`] and
//! returns an axum [`Response`]. Request fields are `Option` so that a
//! missing field is a clean 400 instead of an extractor rejection; remote
//! error detail is logged here and never echoed to the caller.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use super::AppState;
use crate::assistant::ApiError;

// ── Request types ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct AskRequest {
    question: Option<String>,
}

#[derive(Deserialize)]
pub(super) struct NameRequest {
    name: Option<String>,
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Build the `{"error": "..."}` response body.
fn json_error(msg: impl std::fmt::Display) -> Json<serde_json::Value> {
    Json(json!({ "error": format!("{msg}") }))
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// POST /ask
pub(super) async fn ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Response {
    let Some(question) = req.question.filter(|q| !q.is_empty()) else {
        return (StatusCode::BAD_REQUEST, json_error("question is required")).into_response();
    };

    match state.relay.ask(&question).await {
        Ok(response) => (StatusCode::OK, Json(json!({ "response": response }))).into_response(),
        Err(ApiError::Timeout(e)) => {
            warn!(bot_name = %state.bot_name, "ask timed out: {e}");
            (StatusCode::GATEWAY_TIMEOUT, json_error("run timed out")).into_response()
        }
        Err(e) => {
            error!(bot_name = %state.bot_name, "ask failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json_error("internal server error"),
            )
                .into_response()
        }
    }
}

/// POST /submitName
///
/// Echoes the validated name back — and nothing else. Credentials must
/// never appear in a response body.
pub(super) async fn submit_name(Json(req): Json<NameRequest>) -> Response {
    let Some(name) = req.name.filter(|n| !n.is_empty()) else {
        return (StatusCode::BAD_REQUEST, json_error("name is required")).into_response();
    };

    (StatusCode::OK, Json(json!({ "name": name }))).into_response()
}

/// GET /api/health
pub(super) async fn health() -> Response {
    (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response()
}
