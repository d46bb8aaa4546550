//! Post API Tests
//!
//! Authenticated requests whose input is rejected before any write.

use axum::http::StatusCode;
use serde_json::json;

use crate::common::{access_token, assert_status, json_body, TestApp};

#[tokio::test]
async fn test_create_post_rejects_long_body() {
    let app = TestApp::new();
    let body = json!({ "body": "x".repeat(141) });

    let response = app
        .post_json_auth("/api/v1/posts", body, &access_token(1))
        .await;

    assert_status(&response, StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["message"].as_str().unwrap().contains("body"));
}

#[tokio::test]
async fn test_create_post_rejects_empty_body() {
    let app = TestApp::new();

    let response = app
        .post_json_auth("/api/v1/posts", json!({ "body": "" }), &access_token(1))
        .await;

    assert_status(&response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_comment_rejects_long_body() {
    let app = TestApp::new();
    let body = json!({ "body": "y".repeat(200) });

    let response = app
        .post_json_auth("/api/v1/posts/42/comments", body, &access_token(1))
        .await;

    assert_status(&response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_send_message_rejects_empty_body() {
    let app = TestApp::new();

    let response = app
        .post_json_auth("/api/v1/messages/bob", json!({ "body": "" }), &access_token(1))
        .await;

    assert_status(&response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_non_numeric_post_id_is_rejected() {
    let app = TestApp::new();
    let response = app
        .get_auth("/api/v1/posts/not-a-number", &access_token(1))
        .await;
    assert_status(&response, StatusCode::BAD_REQUEST);
}
