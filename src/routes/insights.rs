use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::AppError;
use crate::models::{InsightResult, Row};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateInsightsRequest {
    #[serde(default)]
    data: Vec<Row>,
    #[serde(rename = "fileName", default)]
    file_name: String,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/functions/v1/generate-insights", post(generate_insights))
}

async fn generate_insights(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateInsightsRequest>,
) -> Result<Json<InsightResult>, AppError> {
    let result = state
        .generator
        .generate(&request.data, &request.file_name)
        .await?;
    Ok(Json(result))
}
