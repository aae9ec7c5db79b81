//! HTTP-facing error type
//!
//! Every handler and middleware returns `ApiError`; the `IntoResponse`
//! impl maps it to a status and a `{"message": ...}` body and logs it.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::database::StoreError;
use super::email::MailError;
use super::jwt::TokenError;
use super::oauth::OAuthError;

/// Authentication and authorization failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    MissingToken,
    InvalidToken,
    SessionExpired,
    InvalidPassword,
    FederatedOnly,
    LinkExpired,
    InvalidLink,
    InvalidOAuthState,
    NotAdmin,
    NotSuperAdmin,
}

impl AuthFailure {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthFailure::MissingToken | AuthFailure::InvalidToken | AuthFailure::SessionExpired => {
                StatusCode::UNAUTHORIZED
            }
            AuthFailure::NotAdmin | AuthFailure::NotSuperAdmin => StatusCode::FORBIDDEN,
            AuthFailure::InvalidPassword
            | AuthFailure::FederatedOnly
            | AuthFailure::LinkExpired
            | AuthFailure::InvalidLink
            | AuthFailure::InvalidOAuthState => StatusCode::BAD_REQUEST,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            AuthFailure::MissingToken => "Access denied, token must be provided",
            AuthFailure::InvalidToken => "Access denied, invalid token",
            AuthFailure::SessionExpired => "Session timed-out, please login to continue",
            AuthFailure::InvalidPassword => "Invalid password",
            AuthFailure::FederatedOnly => {
                "This account signs in with Google, password login is not available"
            }
            AuthFailure::LinkExpired => {
                "Verification link expired: Please resend a new verification link"
            }
            AuthFailure::InvalidLink => "Invalid verification link",
            AuthFailure::InvalidOAuthState => "Invalid or expired sign-in request",
            AuthFailure::NotAdmin => "Unauthorized: Not an admin",
            AuthFailure::NotSuperAdmin => "Unauthorized: Not a super admin",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{}", .0.message())]
    Auth(AuthFailure),

    #[error("identity provider error: {0}")]
    Provider(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn user_not_found() -> Self {
        ApiError::NotFound("User not found".to_string())
    }

    pub fn already_verified() -> Self {
        ApiError::Conflict("User already verified, Please proceed to login".to_string())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(vec![message.into()])
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Auth(failure) => failure.status(),
            ApiError::Provider(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation(errors) => {
                log::warn!("Rejected request: {}", self);
                json!({ "message": "Validation failed", "errors": errors })
            }
            ApiError::NotFound(message) | ApiError::Conflict(message) => {
                log::warn!("Rejected request ({}): {}", status, message);
                json!({ "message": message })
            }
            ApiError::Auth(failure) => {
                log::warn!("Auth rejected: {:?}", failure);
                json!({ "message": failure.message() })
            }
            ApiError::Provider(detail) => {
                log::error!("Identity provider error: {}", detail);
                json!({ "message": "Google sign-in failed" })
            }
            ApiError::Internal(detail) => {
                log::error!("Internal error: {}", detail);
                json!({ "message": "Internal server error" })
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail(email) => {
                ApiError::Conflict(format!("Email {} is already registered", email))
            }
            other => ApiError::Internal(format!("store: {}", other)),
        }
    }
}

impl From<MailError> for ApiError {
    fn from(err: MailError) -> Self {
        ApiError::Internal(format!("mail: {}", err))
    }
}

impl From<OAuthError> for ApiError {
    fn from(err: OAuthError) -> Self {
        ApiError::Provider(err.to_string())
    }
}

impl From<argon2::password_hash::Error> for ApiError {
    fn from(err: argon2::password_hash::Error) -> Self {
        ApiError::Internal(format!("password hashing: {}", err))
    }
}

/// Token failures while checking a bearer session
pub fn session_error(err: TokenError) -> ApiError {
    match err {
        TokenError::Expired => ApiError::Auth(AuthFailure::SessionExpired),
        TokenError::Invalid(reason) => {
            log::debug!("Rejected session token: {}", reason);
            ApiError::Auth(AuthFailure::InvalidToken)
        }
        other => ApiError::Internal(other.to_string()),
    }
}

/// Token failures while following a verification link
pub fn link_error(err: TokenError) -> ApiError {
    match err {
        TokenError::Expired => ApiError::Auth(AuthFailure::LinkExpired),
        TokenError::Invalid(reason) => {
            log::debug!("Rejected verification link: {}", reason);
            ApiError::Auth(AuthFailure::InvalidLink)
        }
        other => ApiError::Internal(other.to_string()),
    }
}

/// Signing never fails for a configured secret; anything here is a server fault
pub fn issue_error(err: TokenError) -> ApiError {
    ApiError::Internal(err.to_string())
}
