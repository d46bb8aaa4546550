//! Health and Metrics Endpoint Tests

use axum::http::StatusCode;

use crate::common::{assert_status, json_body, text_body, TestApp};

#[tokio::test]
async fn test_health_check_reports_version() {
    let app = TestApp::new();

    let response = app.get("/health").await;

    assert_status(&response, StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_liveness() {
    let app = TestApp::new();

    let response = app.get("/health/live").await;

    assert_status(&response, StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "alive");
}

#[tokio::test]
async fn test_readiness_fails_without_database() {
    let app = TestApp::new();

    let response = app.get("/health/ready").await;

    assert_status(&response, StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["checks"]["database"]["status"], "unhealthy");
    assert_eq!(body["checks"]["search_index"]["status"], "healthy");
}

#[tokio::test]
async fn test_metrics_exposes_http_counters() {
    let app = TestApp::new();
    app.get("/health").await;

    let response = app.get("/metrics").await;

    assert_status(&response, StatusCode::OK);
    let text = text_body(response).await;
    assert!(text.contains("microblog_http_requests_total"));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::new();
    let response = app.get("/nope").await;
    assert_status(&response, StatusCode::NOT_FOUND);
}
