use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::SummaryStat,
    services::{
        analysis::{project, summarize},
        dataset::{self, FileKind},
        export::{export_file_name, to_csv, to_pdf},
        render::{ChartKind, Dashboard},
        session::{InsightStatus, Session, Upload},
    },
    AppState,
};

const FILE_FIELD: &str = "file";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/:id/upload", post(upload_file))
        .route("/sessions/:id/dashboard", get(get_dashboard))
        .route("/sessions/:id/charts/:chart", get(get_chart))
        .route("/sessions/:id/insights", get(get_insights))
        .route("/sessions/:id/export/csv", get(export_csv))
        .route("/sessions/:id/export/pdf", get(export_pdf))
}

#[derive(Debug, Serialize)]
pub struct SessionCreated {
    session_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    session_id: Uuid,
    file_name: String,
    row_count: usize,
    columns: Vec<String>,
    numeric_columns: Vec<String>,
    label_column: Option<String>,
    time_based: bool,
    stats: Vec<SummaryStat>,
    dashboard: Option<Dashboard>,
    insights: InsightStatus,
}

async fn create_session(State(state): State<Arc<AppState>>) -> (StatusCode, Json<SessionCreated>) {
    let session = state.sessions.create();
    (StatusCode::CREATED, Json(SessionCreated { session_id: session.id() }))
}

async fn upload_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let session = state.sessions.get(id)?;
    let limit = state.config.max_file_size;
    let (file_name, data) = read_file_field(multipart, limit).await?;

    tracing::info!("Upload {} to session {} ({} bytes)", file_name, id, data.len());
    dataset::check_size(data.len(), limit)?;

    // Parsing and chart layout are CPU bound.
    let name = file_name.clone();
    let analysis = tokio::task::spawn_blocking(move || -> Result<_, AppError> {
        let dataset = dataset::ingest(&name, &data)?;
        let stats = summarize(&dataset);
        let projection = project(&dataset);
        let dashboard = Dashboard::from_parts(&name, &dataset, &stats, &projection);
        Ok((dataset, stats, projection, dashboard))
    })
    .await??;
    let (dataset, stats, projection, dashboard) = analysis;

    let initial = if dataset.is_empty() {
        InsightStatus::Idle
    } else if state.insights.is_enabled() {
        InsightStatus::Pending
    } else {
        InsightStatus::Disabled
    };

    let response = UploadResponse {
        session_id: id,
        file_name: file_name.clone(),
        row_count: dataset.len(),
        columns: dataset.columns.clone(),
        numeric_columns: projection.numeric_columns,
        label_column: projection.label_column,
        time_based: projection.time_based,
        stats,
        dashboard: dashboard.clone(),
        insights: initial.clone(),
    };

    let upload = Arc::new(Upload { file_name, dataset, dashboard });
    let token = session.replace_upload(upload.clone(), initial.clone());
    if initial == InsightStatus::Pending {
        spawn_insights(state, session, upload, token);
    }

    Ok(Json(response))
}

/// Pulls the `file` field out of the form. Extension is validated before the
/// body is buffered.
async fn read_file_field(mut multipart: Multipart, limit: usize) -> Result<(String, Bytes), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::InvalidInput("file field has no file name".to_string()))?;
        let kind = FileKind::from_file_name(&file_name)?;
        if field.content_type() != Some(kind.mime_type()) {
            tracing::debug!(
                "{} declared content type {:?}, expected {}",
                file_name,
                field.content_type(),
                kind.mime_type()
            );
        }

        let data = field.bytes().await.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                AppError::FileTooLarge { size: limit + 1, limit }
            } else {
                AppError::InvalidInput(e.body_text())
            }
        })?;
        return Ok((file_name, data));
    }
    Err(AppError::InvalidInput(format!("missing multipart field '{}'", FILE_FIELD)))
}

fn spawn_insights(state: Arc<AppState>, session: Arc<Session>, upload: Arc<Upload>, token: u64) {
    tokio::spawn(async move {
        let result = state
            .insights
            .generate(&upload.dataset.rows, &upload.file_name)
            .await;
        session.complete_insights(token, result);
    });
}

fn current_upload(state: &AppState, id: Uuid) -> Result<Arc<Upload>, AppError> {
    state
        .sessions
        .get(id)?
        .upload()
        .ok_or_else(|| AppError::NotFound("no file uploaded in this session".to_string()))
}

fn current_dashboard(upload: &Upload) -> Result<&Dashboard, AppError> {
    upload
        .dashboard
        .as_ref()
        .ok_or_else(|| AppError::NotFound("the uploaded file has no rows".to_string()))
}

async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Dashboard>, AppError> {
    let upload = current_upload(&state, id)?;
    Ok(Json(current_dashboard(&upload)?.clone()))
}

async fn get_chart(
    State(state): State<Arc<AppState>>,
    Path((id, chart)): Path<(Uuid, String)>,
) -> Result<Response, AppError> {
    let kind: ChartKind = chart.parse()?;
    let upload = current_upload(&state, id)?;
    let spec = current_dashboard(&upload)?
        .chart(kind)
        .ok_or_else(|| AppError::NotFound(format!("{} chart is not shown for this data", kind.as_str())))?;

    let svg = spec.to_svg()?;
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
}

async fn get_insights(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<InsightStatus>, AppError> {
    Ok(Json(state.sessions.get(id)?.insights()))
}

async fn export_csv(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let upload = current_upload(&state, id)?;
    let body = to_csv(&upload.dataset)?;
    let name = export_file_name(&upload.file_name, "csv");
    tracing::info!("Exported {} ({} rows)", name, upload.dataset.len());
    Ok(attachment("text/csv; charset=utf-8", &name, body))
}

async fn export_pdf(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let upload = current_upload(&state, id)?;
    current_dashboard(&upload)?;

    let rendered = upload.clone();
    let body = tokio::task::spawn_blocking(move || to_pdf(current_dashboard(&rendered)?, Utc::now()))
        .await??;

    let name = export_file_name(&upload.file_name, "pdf");
    tracing::info!("Exported {} ({} bytes)", name, body.len());
    Ok(attachment("application/pdf", &name, body))
}

fn attachment(content_type: &'static str, file_name: &str, body: impl IntoResponse) -> Response {
    let safe: String = file_name
        .chars()
        .map(|c| if (c.is_ascii_graphic() && c != '"') || c == ' ' { c } else { '_' })
        .collect();
    let disposition = format!("attachment; filename=\"{}\"", safe);
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}
