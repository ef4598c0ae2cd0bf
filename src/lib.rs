use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use services::insight::{InsightBackend, InsightGenerator};
use services::session::SessionStore;

// Multipart framing on top of the file itself.
const BODY_LIMIT_SLACK: usize = 64 * 1024;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub sessions: SessionStore,
    pub insights: InsightBackend,
    pub generator: InsightGenerator,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let insights = InsightBackend::from_config(&config);
        Self::with_backend(config, insights)
    }

    pub fn with_backend(config: Config, insights: InsightBackend) -> Self {
        Self {
            sessions: SessionStore::new(config.session_ttl, config.session_capacity),
            generator: InsightGenerator::new(config.gateway.clone()),
            insights,
            config,
        }
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    Router::new()
        .merge(routes::routes())
        .merge(routes::sessions::routes())
        .merge(routes::insights::routes())
        .layer(DefaultBodyLimit::max(state.config.max_file_size + BODY_LIMIT_SLACK))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
