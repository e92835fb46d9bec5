//! Request authentication and admin authorization
//!
//! Two middlewares, always layered in this order on protected routes:
//! [`require_auth`] resolves the caller from the bearer token, then
//! [`require_admin`] checks that the caller belongs to the `admin` group.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use gods_shared::{UserId, UserRepository};

use super::jwt::JwtManager;
use crate::error::ApiError;

/// State needed by the auth middlewares
#[derive(Clone)]
pub struct AuthState {
    pub jwt: JwtManager,
    pub users: Arc<dyn UserRepository>,
}

/// The authenticated caller, placed in request extensions by [`require_auth`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: UserId,
}

/// Pull the token out of an `Authorization: Bearer <token>` header value
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Reject requests without a valid session token
///
/// Missing, malformed and expired tokens all produce the same 401.
pub async fn require_auth(
    State(auth): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .ok_or(ApiError::Unauthorized)?;

    let user_id = auth.jwt.validate_token(token).map_err(|e| {
        tracing::debug!(error = %e, "require_auth: Token rejected");
        ApiError::Unauthorized
    })?;

    request.extensions_mut().insert(AuthUser { user_id });
    Ok(next.run(request).await)
}

/// Reject authenticated callers that are not in the `admin` group
///
/// Must run after [`require_auth`]; without an [`AuthUser`] in the request
/// the call is treated as unauthenticated.
pub async fn require_admin(
    State(auth): State<AuthState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let AuthUser { user_id } = request
        .extensions()
        .get::<AuthUser>()
        .copied()
        .ok_or_else(|| {
            tracing::error!("require_admin: No authenticated user, is require_auth layered first?");
            ApiError::Unauthorized
        })?;

    let member = auth
        .users
        .find_with_groups(user_id)
        .await
        .map_err(|e| {
            tracing::error!(user_id = %user_id, error = %e, "require_admin: User lookup failed");
            ApiError::Database(e.to_string())
        })?
        .ok_or_else(|| {
            tracing::warn!(user_id = %user_id, "require_admin: Token subject no longer exists");
            ApiError::Unauthorized
        })?;

    if !member.is_admin() {
        tracing::warn!(user_id = %user_id, "require_admin: Caller is not an admin");
        return Err(ApiError::Forbidden);
    }

    Ok(next.run(request).await)
}
