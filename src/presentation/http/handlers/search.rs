//! Search Handlers

use axum::{
    extract::{Query, State},
    Json,
};
use validator::Validate;

use crate::application::dto::request::SearchQuery;
use crate::application::dto::response::{post_page, PostResponse};
use crate::application::services::SearchService;
use crate::shared::error::AppError;
use crate::shared::pagination::Page;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

/// Full-text post search, `?q=&page=`
pub async fn search_posts(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Page<PostResponse>>, AppError> {
    query.validate().map_err(validation_error)?;

    let page = state
        .search_service()
        .search_posts(&query.q, state.page(query.page))
        .await?;
    Ok(Json(post_page(page)))
}
