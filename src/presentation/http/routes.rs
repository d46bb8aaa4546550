//! Route Configuration
//!
//! Configures all HTTP routes for the API.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use super::handlers;
use crate::presentation::middleware::{auth_middleware, track_metrics};
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes(state.clone()))
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        .route("/metrics", get(handlers::health::metrics_handler))
        .route_layer(middleware::from_fn(track_metrics))
        .with_state(state)
}

/// API v1 routes
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .merge(protected_routes(state))
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
}

/// Everything else requires a bearer token
fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/users", user_routes())
        .route("/posts", post(handlers::post::create_post))
        .nest("/posts", post_routes())
        .route("/feed", get(handlers::post::home_feed))
        .route("/explore", get(handlers::post::explore))
        .route("/messages", get(handlers::message::inbox))
        .route("/messages/{username}", post(handlers::message::send_message))
        .route("/notifications", get(handlers::notification::notifications))
        .route("/search", get(handlers::search::search_posts))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/@me",
            get(handlers::user::get_current_user).patch(handlers::user::update_current_user),
        )
        .route("/{username}", get(handlers::user::get_user))
        .route(
            "/{username}/follow",
            post(handlers::user::follow).delete(handlers::user::unfollow),
        )
        .route("/{username}/posts", get(handlers::user::user_posts))
        .route("/{username}/comments", get(handlers::user::user_comments))
        .route("/{username}/likes", get(handlers::user::user_likes))
        .route("/{username}/following", get(handlers::user::following))
        .route("/{username}/followers", get(handlers::user::followers))
}

fn post_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(handlers::post::get_post)
                .patch(handlers::post::edit_post)
                .delete(handlers::post::delete_post),
        )
        .route(
            "/{id}/comments",
            get(handlers::post::comments).post(handlers::post::create_comment),
        )
        .route(
            "/{id}/like",
            post(handlers::post::like).delete(handlers::post::unlike),
        )
        .route("/{id}/likes", get(handlers::post::likers))
}
