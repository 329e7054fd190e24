//! Deck listing

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::error::Result;
use crate::state::AppState;

#[derive(Serialize)]
pub struct DecksResponse {
    pub decks: Vec<String>,
}

/// GET /api/decks
async fn list_decks(State(state): State<AppState>) -> Result<Json<DecksResponse>> {
    let decks = state.pipeline().notes().deck_names().await?;
    tracing::debug!(count = decks.len(), "Listed decks");
    Ok(Json(DecksResponse { decks }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/decks", get(list_decks))
}

#[cfg(test)]
mod tests {
    use crate::anki::fakes::FakeNoteService;
    use crate::ocr::MockProvider;
    use crate::routes::{app, testing::test_app};
    use axum::http::StatusCode;
    use axum_test::TestServer;

    #[tokio::test]
    async fn test_lists_decks() {
        let test = test_app(MockProvider::failing(), FakeNoteService::default());
        let server = TestServer::new(app(test.state.clone())).unwrap();

        let response = server.get("/api/decks").await;
        response.assert_status_ok();
        assert_eq!(response.json::<serde_json::Value>()["decks"][0], "Default");
    }

    #[tokio::test]
    async fn test_unreachable_anki_is_service_unavailable() {
        let notes = FakeNoteService {
            unreachable: true,
            ..Default::default()
        };
        let test = test_app(MockProvider::failing(), notes);
        let server = TestServer::new(app(test.state.clone())).unwrap();

        let response = server.get("/api/decks").await;
        assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.json::<serde_json::Value>()["errorKind"], "AnkiUnavailable");
    }
}
