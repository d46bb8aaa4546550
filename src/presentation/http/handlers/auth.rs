//! Authentication Handlers

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::application::dto::request::{LoginRequest, RegisterRequest};
use crate::application::dto::response::{RegisterResponse, TokenResponse, UserResponse};
use crate::application::services::AuthService;
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    body.validate().map_err(validation_error)?;

    let (user, tokens) = state
        .auth_service()
        .register(&body.username, &body.email, &body.password)
        .await?;

    let response = RegisterResponse {
        user: UserResponse::from_user(user, true),
        tokens: TokenResponse::from(tokens),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Login with username and password
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    body.validate().map_err(validation_error)?;

    let tokens = state
        .auth_service()
        .authenticate(&body.username, &body.password)
        .await?;

    Ok(Json(TokenResponse::from(tokens)))
}
