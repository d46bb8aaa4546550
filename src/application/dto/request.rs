//! Request DTOs
//!
//! Data structures for API request bodies and query strings.

use serde::Deserialize;
use validator::Validate;

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 64, message = "Username must be 1-64 characters"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 64, message = "Username must be 1-64 characters"))]
    pub username: String,

    #[validate(
        email(message = "Invalid email format"),
        length(max = 120, message = "Email must be at most 120 characters")
    )]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Profile update; absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 64, message = "Username must be 1-64 characters"))]
    pub username: Option<String>,

    #[validate(
        email(message = "Invalid email format"),
        length(max = 120, message = "Email must be at most 120 characters")
    )]
    pub email: Option<String>,

    #[validate(length(max = 140, message = "About me must be at most 140 characters"))]
    pub about_me: Option<String>,
}

/// New post, comment or edited post body
#[derive(Debug, Deserialize, Validate)]
pub struct PostRequest {
    #[validate(length(min = 1, max = 140, message = "Body must be 1-140 characters"))]
    pub body: String,

    #[validate(length(min = 2, max = 5, message = "Language must be 2-5 characters"))]
    pub language: Option<String>,
}

/// Send message request
#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 140, message = "Message must be 1-140 characters"))]
    pub body: String,
}

/// `GET /notifications?since=`
#[derive(Debug, Default, Deserialize)]
pub struct NotificationsQuery {
    /// Unix seconds; defaults to everything.
    #[serde(default)]
    pub since: f64,
}

/// `GET /search?q=&page=`
#[derive(Debug, Deserialize, Validate)]
pub struct SearchQuery {
    #[validate(length(min = 1, max = 256, message = "Query must be 1-256 characters"))]
    pub q: String,

    pub page: Option<i64>,
}
