//! Notification Handlers

use axum::{
    extract::{Extension, Query, State},
    Json,
};

use crate::application::dto::request::NotificationsQuery;
use crate::application::dto::response::NotificationResponse;
use crate::application::services::NotificationService;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Notifications newer than `?since=` (Unix seconds), oldest first
pub async fn notifications(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<NotificationsQuery>,
) -> Result<Json<Vec<NotificationResponse>>, AppError> {
    let notifications = state
        .notification_service()
        .notifications_since(auth.user_id, query.since)
        .await?;

    Ok(Json(
        notifications
            .into_iter()
            .map(NotificationResponse::from)
            .collect(),
    ))
}
