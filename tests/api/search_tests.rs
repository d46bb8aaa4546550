//! Search API Tests
//!
//! Queries with no index hits are answered without touching the database,
//! so they succeed even though the test database is unreachable.

use axum::http::StatusCode;

use microblog::domain::{Post, Searchable};
use microblog::shared::pagination::PageRequest;

use crate::common::{access_token, assert_status, json_body, TestApp};

#[tokio::test]
async fn test_search_without_hits_returns_empty_page() {
    let app = TestApp::new();

    let response = app
        .get_auth("/api/v1/search?q=rust", &access_token(1))
        .await;

    assert_status(&response, StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 0);
    assert_eq!(body["page"], 1);
    assert!(body["next_page"].is_null());
    assert!(body["prev_page"].is_null());
}

#[tokio::test]
async fn test_search_misses_other_documents() {
    let app = TestApp::new();
    let index = app.state.synchronizer.index();
    index
        .add_or_update(Post::COLLECTION, 1, &[("body", "hello tantivy".to_string())])
        .unwrap();

    let response = app
        .get_auth("/api/v1/search?q=postgres&page=2", &access_token(1))
        .await;

    assert_status(&response, StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 0);
    assert_eq!(body["page"], 2);
    assert_eq!(body["prev_page"], 1);
}

#[tokio::test]
async fn test_malformed_query_degrades_to_no_results() {
    let app = TestApp::new();

    let response = app
        .get_auth("/api/v1/search?q=nosuchfield:value", &access_token(1))
        .await;

    assert_status(&response, StatusCode::OK);
    assert_eq!(json_body(response).await["items"], serde_json::json!([]));
}

#[tokio::test]
async fn test_search_requires_query() {
    let app = TestApp::new();

    let response = app.get_auth("/api/v1/search?q=", &access_token(1)).await;

    assert_status(&response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_requires_authentication() {
    let app = TestApp::new();
    let response = app.get("/api/v1/search?q=rust").await;
    assert_status(&response, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_search_with_huge_page_is_empty() {
    let app = TestApp::new();
    let index = app.state.synchronizer.index();
    index
        .add_or_update(Post::COLLECTION, 1, &[("body", "hello tantivy".to_string())])
        .unwrap();

    let response = app
        .get_auth(
            "/api/v1/search?q=hello&page=9223372036854775807",
            &access_token(1),
        )
        .await;

    assert_status(&response, StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["items"], serde_json::json!([]));
    assert_eq!(body["page"], PageRequest::last_page(5));
    assert!(body["next_page"].is_null());
}

#[tokio::test]
async fn test_reindex_is_not_exposed() {
    let app = TestApp::new();

    let response = app
        .post_json_auth("/api/v1/search/reindex", serde_json::json!({}), &access_token(1))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
