use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use datavision_services::config::{Config, EndpointConfig};
use datavision_services::services::insight::{InsightBackend, InsightClient};
use datavision_services::{app, AppState};

const BOUNDARY: &str = "----datavision-test-boundary";

fn monthly_sales_csv() -> String {
    let months = ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];
    let mut csv = String::from("month,revenue,region\n");
    for (i, month) in months.iter().enumerate() {
        csv.push_str(&format!("{},{},{}\n", month, 100 + i * 10, if i % 2 == 0 { "West" } else { "East" }));
    }
    csv
}

fn test_app(config: Config, backend: InsightBackend) -> Router {
    app(Arc::new(AppState::with_backend(config, backend)))
}

fn disabled_app() -> Router {
    test_app(Config::default(), InsightBackend::Disabled)
}

/// Serves `router` on an ephemeral local port and returns its base URL.
async fn spawn_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn remote_backend(base: &str) -> InsightBackend {
    InsightBackend::Remote(InsightClient::new(EndpointConfig {
        url: format!("{}/generate-insights", base),
        api_key: None,
    }))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, header::HeaderMap, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, body.to_vec())
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, _, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

async fn create_session(app: &Router) -> String {
    let request = Request::builder()
        .method("POST")
        .uri("/sessions")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(app, request).await;
    assert_eq!(status, StatusCode::CREATED);
    let body: Value = serde_json::from_slice(&body).unwrap();
    body["session_id"].as_str().unwrap().to_string()
}

fn multipart_body(file_name: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

async fn upload(app: &Router, session: &str, file_name: &str, content: &[u8]) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(format!("/sessions/{}/upload", session))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(file_name, content)))
        .unwrap();
    let (status, _, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

/// Polls the insight status until it leaves `pending`.
async fn settled_insights(app: &Router, session: &str) -> Value {
    for _ in 0..100 {
        let (_, status) = get_json(app, &format!("/sessions/{}/insights", session)).await;
        if status["state"] != "pending" {
            return status;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("insights never settled");
}

#[tokio::test]
async fn health_and_landing_page() {
    let app = disabled_app();

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, headers, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
    assert!(String::from_utf8(body).unwrap().contains("upload-form"));
}

#[tokio::test]
async fn cors_preflight_allows_put() {
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/sessions")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = send(&disabled_app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap();
    for method in ["GET", "POST", "PUT", "OPTIONS"] {
        assert!(methods.contains(method), "{method} missing from {methods}");
    }
}

#[tokio::test]
async fn csv_upload_builds_the_dashboard() {
    let app = disabled_app();
    let session = create_session(&app).await;

    let (status, body) = upload(&app, &session, "sales.csv", monthly_sales_csv().as_bytes()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["file_name"], "sales.csv");
    assert_eq!(body["row_count"], 12);
    assert_eq!(body["numeric_columns"], json!(["revenue"]));
    assert_eq!(body["label_column"], "month");
    assert_eq!(body["time_based"], true);
    assert_eq!(body["insights"]["state"], "disabled");

    // Stats cover every row; charts only the first ten.
    let stat = &body["stats"][0];
    assert_eq!(stat["column"], "revenue");
    assert_eq!(stat["sum"], 1860.0);
    assert_eq!(stat["min"], 100.0);
    assert_eq!(stat["max"], 210.0);

    let (status, dashboard) = get_json(&app, &format!("/sessions/{}/dashboard", session)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["stat_cards"][0]["average"], "155.00");
    assert_eq!(dashboard["stat_cards"][0]["range"], "100.0 - 210.0");
    assert_eq!(dashboard["bar_chart"]["points"].as_array().unwrap().len(), 10);
    assert_eq!(dashboard["pie_chart"]["points"].as_array().unwrap().len(), 6);
    assert_eq!(dashboard["preview"]["headers"], json!(["month", "revenue", "region"]));

    for chart in ["bar", "line", "pie"] {
        let request = Request::builder()
            .uri(format!("/sessions/{}/charts/{}", session, chart))
            .body(Body::empty())
            .unwrap();
        let (status, headers, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK, "{chart}");
        assert_eq!(headers[header::CONTENT_TYPE], "image/svg+xml");
        assert!(String::from_utf8(body).unwrap().starts_with("<svg"));
    }
}

#[tokio::test]
async fn line_chart_only_for_time_based_labels() {
    let app = disabled_app();
    let session = create_session(&app).await;

    let (status, body) = upload(&app, &session, "regions.csv", b"region,revenue\nWest,10\nEast,20\n").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["time_based"], false);
    assert!(body["dashboard"]["line_chart"].is_null());

    let (status, error) = get_json(&app, &format!("/sessions/{}/charts/line", session)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(error["error"].is_string());
}

#[tokio::test]
async fn xlsx_upload_reads_the_first_sheet() {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "product").unwrap();
    sheet.write_string(0, 1, "units").unwrap();
    sheet.write_string(1, 0, "Widget").unwrap();
    sheet.write_number(1, 1, 4.0).unwrap();
    sheet.write_string(2, 0, "Gadget").unwrap();
    sheet.write_number(2, 1, 6.0).unwrap();
    let bytes = workbook.save_to_buffer().unwrap();

    let app = disabled_app();
    let session = create_session(&app).await;
    let (status, body) = upload(&app, &session, "Inventory.XLSX", &bytes).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["row_count"], 2);
    assert_eq!(body["numeric_columns"], json!(["units"]));
    assert_eq!(body["stats"][0]["average"], 5.0);
}

#[tokio::test]
async fn rejected_uploads_keep_the_previous_dataset() {
    let app = disabled_app();
    let session = create_session(&app).await;
    upload(&app, &session, "sales.csv", monthly_sales_csv().as_bytes()).await;

    let (status, body) = upload(&app, &session, "notes.txt", b"hello").await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["error"], "Unsupported file format. Use .xlsx or .csv");

    let (status, body) = upload(&app, &session, "broken.xlsx", b"not a workbook").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());

    let (_, dashboard) = get_json(&app, &format!("/sessions/{}/dashboard", session)).await;
    assert_eq!(dashboard["file_name"], "sales.csv");
    assert_eq!(dashboard["row_count"], 12);
}

#[tokio::test]
async fn oversized_files_are_rejected() {
    let config = Config {
        max_file_size: 64,
        ..Config::default()
    };
    let app = test_app(config, InsightBackend::Disabled);
    let session = create_session(&app).await;

    let (status, body) = upload(&app, &session, "sales.csv", monthly_sales_csv().as_bytes()).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["error"].as_str().unwrap().contains("64"));
}

#[tokio::test]
async fn empty_file_shows_nothing() {
    let app = disabled_app();
    let session = create_session(&app).await;

    let (status, body) = upload(&app, &session, "empty.csv", b"").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["row_count"], 0);
    assert!(body["dashboard"].is_null());
    assert_eq!(body["insights"]["state"], "idle");

    let (status, _) = get_json(&app, &format!("/sessions/{}/dashboard", session)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let app = disabled_app();
    let (status, body) = get_json(&app, "/sessions/00000000-0000-4000-8000-000000000000/insights").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("session"));
}

#[tokio::test]
async fn exports_download_as_attachments() {
    let app = disabled_app();
    let session = create_session(&app).await;
    upload(&app, &session, "sales.csv", monthly_sales_csv().as_bytes()).await;

    let request = Request::builder()
        .uri(format!("/sessions/{}/export/csv", session))
        .body(Body::empty())
        .unwrap();
    let (status, headers, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"sales_analysis.csv\""
    );
    let csv = String::from_utf8(body).unwrap();
    assert_eq!(csv, monthly_sales_csv());

    let request = Request::builder()
        .uri(format!("/sessions/{}/export/pdf", session))
        .body(Body::empty())
        .unwrap();
    let (status, headers, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"sales_analysis.pdf\""
    );
    assert!(body.starts_with(b"%PDF-"));
}

#[tokio::test]
async fn insights_arrive_from_the_remote_endpoint() {
    let upstream = Router::new().route(
        "/generate-insights",
        post(|Json(body): Json<Value>| async move {
            let rows = body["data"].as_array().map_or(0, Vec::len);
            Json(json!({
                "insights": [format!("{} rows in {}", rows, body["fileName"].as_str().unwrap_or(""))],
                "actionPlan": ["Grow the East region"]
            }))
        }),
    );
    let base = spawn_upstream(upstream).await;
    let app = test_app(Config::default(), remote_backend(&base));
    let session = create_session(&app).await;

    let (status, body) = upload(&app, &session, "sales.csv", monthly_sales_csv().as_bytes()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["insights"]["state"], "pending");

    // The endpoint receives every row, not the ten-row projection.
    let insights = settled_insights(&app, &session).await;
    assert_eq!(insights["state"], "ready");
    assert_eq!(insights["insights"], json!(["12 rows in sales.csv"]));
    assert_eq!(insights["actionPlan"], json!(["Grow the East region"]));
}

#[tokio::test]
async fn rate_limited_insights_leave_the_dashboard_intact() {
    let upstream = Router::new().route(
        "/generate-insights",
        post(|| async {
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({"error": "Rate limit exceeded. Please try again later."})),
            )
        }),
    );
    let base = spawn_upstream(upstream).await;
    let app = test_app(Config::default(), remote_backend(&base));
    let session = create_session(&app).await;

    let (status, _) = upload(&app, &session, "sales.csv", monthly_sales_csv().as_bytes()).await;
    assert_eq!(status, StatusCode::OK);

    let insights = settled_insights(&app, &session).await;
    assert_eq!(insights["state"], "failed");
    assert_eq!(insights["message"], "Rate limit exceeded. Please try again later.");

    let (status, dashboard) = get_json(&app, &format!("/sessions/{}/dashboard", session)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["row_count"], 12);
}

fn gateway_config(base: &str) -> Config {
    let mut config = Config::default();
    config.gateway.base_url = format!("{}/v1", base);
    config.gateway.api_key = Some("test-key".into());
    config
}

async fn post_generate(app: &Router, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/functions/v1/generate-insights")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, _, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn generate_insights_extracts_json_from_the_model_reply() {
    let gateway = Router::new().route(
        "/v1/chat/completions",
        post(|Json(request): Json<Value>| async move {
            assert_eq!(request["messages"][0]["role"], "system");
            Json(json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": "Hasil analisis:\n```json\n{\"insights\": [\"Revenue grows\"], \"actionPlan\": [\"Invest\"]}\n```"
                    }
                }]
            }))
        }),
    );
    let base = spawn_upstream(gateway).await;
    let app = test_app(gateway_config(&base), InsightBackend::Disabled);

    let (status, body) = post_generate(
        &app,
        json!({"data": [{"month": "Jan", "revenue": 100}], "fileName": "sales.csv"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"insights": ["Revenue grows"], "actionPlan": ["Invest"]}));
}

#[tokio::test]
async fn generate_insights_passes_through_payment_required() {
    let gateway = Router::new().route(
        "/v1/chat/completions",
        post(|| async { (StatusCode::PAYMENT_REQUIRED, "no credits") }),
    );
    let base = spawn_upstream(gateway).await;
    let app = test_app(gateway_config(&base), InsightBackend::Disabled);

    let (status, body) = post_generate(&app, json!({"data": [{"a": 1}], "fileName": "a.csv"})).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["error"], "Payment required. Please add credits to continue.");
}

#[tokio::test]
async fn generate_insights_reports_other_gateway_failures_as_500() {
    let gateway = Router::new().route(
        "/v1/chat/completions",
        post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "overloaded") }),
    );
    let base = spawn_upstream(gateway).await;
    let app = test_app(gateway_config(&base), InsightBackend::Disabled);

    let (status, body) = post_generate(&app, json!({"data": [{"a": 1}], "fileName": "a.csv"})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "AI gateway error");
}

#[tokio::test]
async fn generate_insights_rejects_empty_data() {
    let app = test_app(gateway_config("http://127.0.0.1:9"), InsightBackend::Disabled);
    let (status, body) = post_generate(&app, json!({"data": [], "fileName": "a.csv"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}
