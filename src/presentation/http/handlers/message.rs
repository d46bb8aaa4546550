//! Private Message Handlers

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::application::dto::request::SendMessageRequest;
use crate::application::dto::response::{MessageResponse, SentMessageResponse};
use crate::application::services::MessageService;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::pagination::{Page, PageQuery};
use crate::shared::validation::validation_error;
use crate::startup::AppState;

/// Send a private message to `username`
pub async fn send_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(username): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<SentMessageResponse>), AppError> {
    body.validate().map_err(validation_error)?;

    let message = state
        .message_service()
        .send_message(auth.user_id, &username, &body.body)
        .await?;

    let response = SentMessageResponse {
        id: message.id.to_string(),
        recipient_id: message.recipient_id.to_string(),
        created_at: message.created_at.to_rfc3339(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Received messages, newest first. Reading the inbox marks everything read.
pub async fn inbox(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<MessageResponse>>, AppError> {
    let page = state
        .message_service()
        .inbox(auth.user_id, state.page(query.page))
        .await?;
    Ok(Json(page.map(MessageResponse::from)))
}
