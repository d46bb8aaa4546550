//! Authentication API Tests
//!
//! Input validation and token checks happen before any database access.

use axum::http::StatusCode;
use serde_json::json;

use crate::common::{assert_status, expired_token, json_body, TestApp};

#[tokio::test]
async fn test_register_with_invalid_email_fails() {
    let app = TestApp::new();
    let body = json!({
        "username": "alice",
        "email": "not-an-email",
        "password": "ValidPassword123!"
    });

    let response = app.post_json("/api/v1/auth/register", body).await;

    assert_status(&response, StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["code"], 10007);
    assert!(body["message"].as_str().unwrap().contains("email"));
}

#[tokio::test]
async fn test_register_with_short_password_fails() {
    let app = TestApp::new();
    let body = json!({
        "username": "alice",
        "email": "alice@example.com",
        "password": "short"
    });

    let response = app.post_json("/api/v1/auth/register", body).await;

    assert_status(&response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_requires_username() {
    let app = TestApp::new();
    let body = json!({ "username": "", "password": "whatever" });

    let response = app.post_json("/api/v1/auth/login", body).await;

    assert_status(&response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let app = TestApp::new();

    let response = app.get("/api/v1/feed").await;

    assert_status(&response, StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["code"], 10003);
}

#[tokio::test]
async fn test_protected_route_with_garbage_token() {
    let app = TestApp::new();
    let response = app.get_auth("/api/v1/explore", "not.a.jwt").await;
    assert_status(&response, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_with_expired_token() {
    let app = TestApp::new();

    let response = app.get_auth("/api/v1/explore", &expired_token(1)).await;

    assert_status(&response, StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert!(body["message"].as_str().unwrap().contains("expired"));
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let app = TestApp::new();
    let forged = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &json!({ "sub": "1", "exp": 4_000_000_000_i64, "iat": 0 }),
        &jsonwebtoken::EncodingKey::from_secret(b"some-other-secret-of-sufficient-length"),
    )
    .unwrap();

    let response = app.get_auth("/api/v1/feed", &forged).await;

    assert_status(&response, StatusCode::UNAUTHORIZED);
}
