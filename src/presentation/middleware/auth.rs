//! Authentication Middleware
//!
//! JWT validation for protected routes. Every authenticated request also
//! refreshes the caller's `last_seen`.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::application::services::auth_service::decode_access_token;
use crate::application::services::UserService;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Authenticated user extension
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: i64,
}

/// Pull the token out of an `Authorization: Bearer <token>` header value.
fn bearer_token(header: &str) -> Result<&str, AppError> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization header format".into()))
}

/// Authentication middleware that validates JWT tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?;

    let token = bearer_token(auth_header)?;
    let claims = decode_access_token(token, &state.settings.jwt.secret)?;
    let user_id = claims.user_id()?;

    if let Err(e) = state.user_service().touch_last_seen(user_id).await {
        tracing::warn!(user_id, error = %e, "Failed to update last_seen");
    }

    request.extensions_mut().insert(AuthUser { user_id });
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_bearer_token_extracts_token() {
        assert_eq!(bearer_token("Bearer abc.def").unwrap(), "abc.def");
    }

    #[test_case("abc.def" ; "missing scheme")]
    #[test_case("Basic abc" ; "wrong scheme")]
    #[test_case("Bearer " ; "empty token")]
    fn test_bearer_token_rejects(header: &str) {
        assert!(matches!(bearer_token(header), Err(AppError::Unauthorized(_))));
    }
}
