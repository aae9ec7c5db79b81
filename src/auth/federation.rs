//! Google sign-in mapped onto local accounts

use super::error::{issue_error, ApiError, AuthFailure};
use super::models::{normalize_email, Account, FederatedProfile, OAuthCallback, TokenPurpose};
use super::oauth::OAuthError;
use super::routes::AuthState;

/// Consent screen URL with a signed, short-lived `state`
pub fn begin_google_sign_in(state: &AuthState) -> Result<String, ApiError> {
    let csrf = state.tokens.issue_oauth_state().map_err(issue_error)?;
    Ok(state.google.authorize_url(&csrf)?)
}

/// Handle the redirect back from Google
pub async fn complete_google_sign_in(
    state: &AuthState,
    callback: OAuthCallback,
) -> Result<(Account, String), ApiError> {
    if let Some(error) = callback.error {
        return Err(OAuthError::Denied(error).into());
    }

    let csrf = callback
        .state
        .ok_or(ApiError::Auth(AuthFailure::InvalidOAuthState))?;
    state
        .tokens
        .verify(&csrf, TokenPurpose::OAuthState)
        .map_err(|_| ApiError::Auth(AuthFailure::InvalidOAuthState))?;

    let code = callback
        .code
        .ok_or_else(|| ApiError::validation("Missing authorization code"))?;
    let profile = state.google.exchange_code(&code).await?;

    federated_login(state, profile)
}

/// Find or create the local account for a provider profile and issue a session
///
/// New accounts copy the provider's verification flag and get no local
/// password. An existing account with the same email is signed in as is.
pub fn federated_login(
    state: &AuthState,
    profile: FederatedProfile,
) -> Result<(Account, String), ApiError> {
    let email = normalize_email(&profile.email);
    if email.is_empty() {
        return Err(OAuthError::MissingEmail.into());
    }

    let account = match state.store.find_by_email(&email)? {
        Some(existing) => {
            log::info!("Google sign-in for existing account {}", existing.id);
            existing
        }
        None => {
            let display_name = match profile.display_name.trim() {
                "" => email.split('@').next().unwrap_or_default().to_string(),
                name => name.to_string(),
            };
            let mut account = Account::new(&display_name, &email, None);
            account.verified = profile.email_verified;
            state.store.create(&account)?;
            log::info!("Created account {} from Google sign-in", account.id);
            account
        }
    };

    let token = state
        .tokens
        .issue_session(&account.id, account.roles())
        .map_err(issue_error)?;
    Ok((account, token))
}
