//! AnkiConnect connectivity check

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
#[serde(untagged)]
pub enum AnkiStatus {
    Connected {
        connected: bool,
        version: u32,
        message: &'static str,
    },
    Disconnected {
        connected: bool,
        error: String,
        message: &'static str,
    },
}

/// GET /api/anki-status
async fn anki_status(State(state): State<AppState>) -> Response {
    match state.pipeline().notes().version().await {
        Ok(version) => Json(AnkiStatus::Connected {
            connected: true,
            version,
            message: "AnkiConnect is reachable",
        })
        .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "AnkiConnect status check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(AnkiStatus::Disconnected {
                    connected: false,
                    error: e.to_string(),
                    message: "Could not connect to AnkiConnect. Make sure Anki is running with the AnkiConnect add-on installed.",
                }),
            )
                .into_response()
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/anki-status", get(anki_status))
}
