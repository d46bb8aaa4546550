//! Post Handlers
//!
//! Feeds, posts, comment threads and likes.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::application::dto::request::PostRequest;
use crate::application::dto::response::{post_page, user_page, PostResponse, UserResponse};
use crate::application::services::{CreatePostDto, PostService};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::pagination::{Page, PageQuery};
use crate::shared::validation::validation_error;
use crate::startup::AppState;

fn post_input(body: PostRequest) -> Result<CreatePostDto, AppError> {
    body.validate().map_err(validation_error)?;
    Ok(CreatePostDto {
        body: body.body,
        language: body.language,
    })
}

/// Own posts and posts of followed users
pub async fn home_feed(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<PostResponse>>, AppError> {
    let page = state
        .post_service()
        .home_feed(auth.user_id, state.page(query.page))
        .await?;
    Ok(Json(post_page(page)))
}

/// Every post, newest first
pub async fn explore(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<PostResponse>>, AppError> {
    let page = state.post_service().explore(state.page(query.page)).await?;
    Ok(Json(post_page(page)))
}

pub async fn create_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<PostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), AppError> {
    let view = state
        .post_service()
        .create_post(auth.user_id, post_input(body)?)
        .await?;
    Ok((StatusCode::CREATED, Json(PostResponse::from(view))))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<Json<PostResponse>, AppError> {
    let view = state.post_service().get_post(post_id).await?;
    Ok(Json(PostResponse::from(view)))
}

pub async fn edit_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(post_id): Path<i64>,
    Json(body): Json<PostRequest>,
) -> Result<Json<PostResponse>, AppError> {
    let view = state
        .post_service()
        .edit_post(auth.user_id, post_id, post_input(body)?)
        .await?;
    Ok(Json(PostResponse::from(view)))
}

/// Delete a post and its comment thread
pub async fn delete_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(post_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.post_service().delete_post(auth.user_id, post_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn comments(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<PostResponse>>, AppError> {
    let page = state
        .post_service()
        .comments(post_id, state.page(query.page))
        .await?;
    Ok(Json(post_page(page)))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(post_id): Path<i64>,
    Json(body): Json<PostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), AppError> {
    let view = state
        .post_service()
        .create_comment(auth.user_id, post_id, post_input(body)?)
        .await?;
    Ok((StatusCode::CREATED, Json(PostResponse::from(view))))
}

pub async fn like(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(post_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.post_service().like(auth.user_id, post_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unlike(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(post_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.post_service().unlike(auth.user_id, post_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Users who liked a post
pub async fn likers(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<UserResponse>>, AppError> {
    let page = state
        .post_service()
        .likers(post_id, state.page(query.page))
        .await?;
    Ok(Json(user_page(page)))
}
