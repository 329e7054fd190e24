//! Health check endpoints

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::ocr::OcrProvider;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub service: &'static str,
    pub ocr_provider: OcrProvider,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service: "kioku-server",
        ocr_provider: state.pipeline().ocr().provider_type(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}

#[cfg(test)]
mod tests {
    use crate::anki::fakes::FakeNoteService;
    use crate::ocr::MockProvider;
    use crate::routes::{app, testing::test_app};
    use axum_test::TestServer;

    #[tokio::test]
    async fn test_health() {
        let test = test_app(MockProvider::failing(), FakeNoteService::default());
        let server = TestServer::new(app(test.state.clone())).unwrap();

        let response = server.get("/health").await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "kioku-server");
        assert_eq!(body["ocrProvider"], "tesseract");
    }
}
