//! Bearer-token authentication and role gates
//!
//! `authenticate` resolves the `Authorization: Bearer <token>` header into an
//! `AuthenticatedUser` request extension. The gates run after it and only look
//! at the role flags carried by the token.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::error::{session_error, ApiError, AuthFailure};
use super::models::{AuthenticatedUser, TokenPurpose};
use super::routes::AuthState;

/// Token from the authorization header, `None` when absent or empty
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Validate a session token and confirm its account still exists
pub fn resolve_session(state: &AuthState, token: &str) -> Result<AuthenticatedUser, ApiError> {
    let claims = state
        .tokens
        .verify(token, TokenPurpose::Session)
        .map_err(session_error)?;

    if state.store.find_by_id(&claims.sub)?.is_none() {
        return Err(ApiError::NotFound(
            "Authentication failed: User not found".to_string(),
        ));
    }
    Ok(AuthenticatedUser { claims })
}

pub async fn authenticate(
    State(state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token =
        extract_bearer(request.headers()).ok_or(ApiError::Auth(AuthFailure::MissingToken))?;
    let user = resolve_session(&state, token)?;
    log::debug!("Authenticated request from {}", user.account_id());

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Admin gate; super admins pass as well
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = attached_user(&request)?;
    if !(user.is_admin() || user.is_super_admin()) {
        return Err(ApiError::Auth(AuthFailure::NotAdmin));
    }
    Ok(next.run(request).await)
}

pub async fn require_super_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    if !attached_user(&request)?.is_super_admin() {
        return Err(ApiError::Auth(AuthFailure::NotSuperAdmin));
    }
    Ok(next.run(request).await)
}

fn attached_user(request: &Request) -> Result<&AuthenticatedUser, ApiError> {
    request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or(ApiError::Auth(AuthFailure::MissingToken))
}
