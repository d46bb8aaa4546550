//! User Handlers
//!
//! Profiles, profile listings and the follow relation.

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use validator::Validate;

use crate::application::dto::request::UpdateProfileRequest;
use crate::application::dto::response::{
    post_page, user_page, PostResponse, ProfileResponse, UserResponse,
};
use crate::application::services::{PostService, UpdateProfileDto, UserService};
use crate::domain::User;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::pagination::{Page, PageQuery};
use crate::shared::validation::validation_error;
use crate::startup::AppState;

async fn profile(
    state: &AppState,
    viewer: AuthUser,
    user: User,
) -> Result<ProfileResponse, AppError> {
    let is_self = user.id == viewer.user_id;
    let is_following = if is_self {
        false
    } else {
        state
            .user_service()
            .is_following(viewer.user_id, user.id)
            .await?
    };

    Ok(ProfileResponse {
        user: UserResponse::from_user(user, is_self),
        is_following,
    })
}

/// Get current authenticated user
pub async fn get_current_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.user_service().get_user(auth.user_id).await?;
    Ok(Json(UserResponse::from_user(user, true)))
}

/// Update current user profile
pub async fn update_current_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    body.validate().map_err(validation_error)?;

    let update = UpdateProfileDto {
        username: body.username,
        email: body.email,
        about_me: body.about_me,
    };
    let user = state
        .user_service()
        .update_profile(auth.user_id, update)
        .await?;

    Ok(Json(UserResponse::from_user(user, true)))
}

/// Get a user's profile by username
pub async fn get_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(username): Path<String>,
) -> Result<Json<ProfileResponse>, AppError> {
    let user = state.user_service().get_user_by_username(&username).await?;
    Ok(Json(profile(&state, auth, user).await?))
}

pub async fn follow(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(username): Path<String>,
) -> Result<Json<ProfileResponse>, AppError> {
    let user = state.user_service().follow(auth.user_id, &username).await?;
    Ok(Json(ProfileResponse {
        user: UserResponse::from_user(user, false),
        is_following: true,
    }))
}

pub async fn unfollow(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(username): Path<String>,
) -> Result<Json<ProfileResponse>, AppError> {
    let user = state.user_service().unfollow(auth.user_id, &username).await?;
    Ok(Json(ProfileResponse {
        user: UserResponse::from_user(user, false),
        is_following: false,
    }))
}

/// Top-level posts of a user
pub async fn user_posts(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<PostResponse>>, AppError> {
    let page = state
        .post_service()
        .user_posts(&username, state.page(query.page))
        .await?;
    Ok(Json(post_page(page)))
}

/// Comments written by a user
pub async fn user_comments(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<PostResponse>>, AppError> {
    let page = state
        .post_service()
        .user_comments(&username, state.page(query.page))
        .await?;
    Ok(Json(post_page(page)))
}

/// Posts a user liked
pub async fn user_likes(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<PostResponse>>, AppError> {
    let page = state
        .post_service()
        .liked_posts(&username, state.page(query.page))
        .await?;
    Ok(Json(post_page(page)))
}

pub async fn following(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<UserResponse>>, AppError> {
    let page = state
        .user_service()
        .following(&username, state.page(query.page))
        .await?;
    Ok(Json(user_page(page)))
}

pub async fn followers(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<UserResponse>>, AppError> {
    let page = state
        .user_service()
        .followers(&username, state.page(query.page))
        .await?;
    Ok(Json(user_page(page)))
}
