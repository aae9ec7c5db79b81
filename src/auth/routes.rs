//! Back office REST API routes

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Redirect},
    routing::{get, patch, post},
    Json, Router,
};
use std::sync::Arc;

use super::{
    accounts,
    database::CredentialStore,
    email::EmailSender,
    error::ApiError,
    federation,
    jwt::{TokenConfig, TokenService},
    middleware::{authenticate, require_super_admin},
    models::*,
    oauth::{GoogleConfig, GoogleOAuth},
    verification::{self, AutoVerifyOutcome},
};

pub const DEFAULT_APP_URL: &str = "http://localhost:4060";

/// Shared state behind every handler
pub struct AuthState {
    pub store: CredentialStore,
    pub tokens: TokenService,
    pub google: GoogleOAuth,
    pub mailer: EmailSender,
    /// Base of the links put in verification emails
    pub app_url: String,
}

impl AuthState {
    pub fn new(
        store: CredentialStore,
        tokens: TokenService,
        google: GoogleOAuth,
        mailer: EmailSender,
        app_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            tokens,
            google,
            mailer,
            app_url: app_url.into(),
        }
    }

    pub fn from_env(db_path: &str) -> crate::Result<Self> {
        let store = CredentialStore::open(db_path)?;
        let tokens = TokenService::new(TokenConfig::from_env()?);
        let app_url = std::env::var("APP_URL").unwrap_or_else(|_| DEFAULT_APP_URL.to_string());

        let google = GoogleOAuth::new(GoogleConfig::from_env(&app_url));
        if !google.is_configured() {
            log::warn!("GOOGLE_CLIENT_ID/GOOGLE_CLIENT_SECRET not set, Google sign-in disabled");
        }

        Ok(Self::new(store, tokens, google, EmailSender::from_env(), app_url))
    }
}

/// Create the API router
pub fn auth_router(state: Arc<AuthState>) -> Router {
    // Layers run bottom-up: authenticate first, then the role gate.
    let super_admin = Router::new()
        .route("/users/{id}", patch(promote_user))
        .route_layer(from_fn(require_super_admin))
        .route_layer(from_fn_with_state(state.clone(), authenticate));

    Router::new()
        .route("/", get(welcome))
        // Registration and verification
        .route("/register", post(register))
        .route("/verify-user/{token}", get(verify_user))
        .route("/verify-or-resend/{token}", get(verify_or_resend))
        .route("/resend-verification", get(resend_verification))
        // Sessions
        .route("/login", post(login))
        .route("/googleAuthenticate", get(google_authenticate))
        .route("/auth/google/login", get(google_callback))
        // Accounts
        .route("/users", get(list_users))
        .merge(super_admin)
        .with_state(state)
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::validation(rejection.body_text()))
}

/// GET /
async fn welcome() -> Json<MessageResponse> {
    Json(MessageResponse::new("Welcome to the Hotel Back Office API"))
}

/// POST /register
async fn register(
    State(state): State<Arc<AuthState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let account = verification::register(&state, json_body(payload)?).await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            message: "User created successfully".to_string(),
            data: account,
        }),
    ))
}

/// GET /verify-user/{token}
async fn verify_user(
    State(state): State<Arc<AuthState>>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let account = verification::verify(&state, &token)?;

    Ok(Json(DataResponse {
        message: "User verified successfully".to_string(),
        data: account,
    }))
}

/// GET /verify-or-resend/{token}
async fn verify_or_resend(
    State(state): State<Arc<AuthState>>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let response = match verification::verify_or_resend(&state, &token).await? {
        AutoVerifyOutcome::Verified(account) => Json(DataResponse {
            message: "User verified successfully".to_string(),
            data: account,
        })
        .into_response(),
        AutoVerifyOutcome::LinkResent => Json(MessageResponse::new(
            "Link expired: A new verification link has been sent to your email",
        ))
        .into_response(),
    };
    Ok(response)
}

/// GET /resend-verification
///
/// Reads `email` from a JSON body; a missing or unreadable body counts as a
/// missing email.
async fn resend_verification(
    State(state): State<Arc<AuthState>>,
    payload: Result<Json<ResendVerificationRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let email = payload.ok().and_then(|Json(req)| req.email);
    verification::resend(&state, email.as_deref()).await?;

    Ok(Json(MessageResponse::new("Verification link sent successfully")))
}

/// POST /login
async fn login(
    State(state): State<Arc<AuthState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let (account, token) = accounts::login(&state, json_body(payload)?)?;

    Ok(Json(AuthResponse {
        message: "Login successfully".to_string(),
        data: account,
        token,
    }))
}

/// GET /users
async fn list_users(State(state): State<Arc<AuthState>>) -> Result<impl IntoResponse, ApiError> {
    let users = accounts::list_accounts(&state)?;

    Ok(Json(DataResponse {
        message: "Users fetched successfully".to_string(),
        data: users,
    }))
}

/// PATCH /users/{id} (super admin only)
async fn promote_user(
    State(state): State<Arc<AuthState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let account = accounts::promote_to_admin(&state, &id)?;

    Ok(Json(DataResponse {
        message: format!("User {} is now an admin", account.full_name),
        data: account,
    }))
}

/// GET /googleAuthenticate
async fn google_authenticate(
    State(state): State<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    let url = federation::begin_google_sign_in(&state)?;
    Ok(Redirect::temporary(&url))
}

/// GET /auth/google/login
async fn google_callback(
    State(state): State<Arc<AuthState>>,
    Query(callback): Query<OAuthCallback>,
) -> Result<impl IntoResponse, ApiError> {
    let (account, token) = federation::complete_google_sign_in(&state, callback).await?;

    Ok(Json(AuthResponse {
        message: "Login successfully".to_string(),
        data: account,
        token,
    }))
}
