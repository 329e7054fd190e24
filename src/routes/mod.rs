//! Route modules for Kioku Server

pub mod cards;
pub mod decks;
pub mod health;
pub mod status;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/health", health::router())
        .nest("/api", api_router(&state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn api_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(cards::router(state.config().server.max_upload_bytes))
        .merge(decks::router())
        .merge(status::router())
}
