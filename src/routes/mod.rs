use std::sync::Arc;

use axum::{extract::State, response::Html, routing::get, Router};

use crate::services::render::landing::landing_page;
use crate::AppState;

pub mod insights;
pub mod sessions;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(landing))
        .route("/health", get(health_check))
}

async fn health_check() -> &'static str {
    "OK"
}

async fn landing(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(landing_page(&state.config))
}
