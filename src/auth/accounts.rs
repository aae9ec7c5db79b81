//! Password login and role management

use super::database::CredentialStore;
use super::error::{issue_error, ApiError, AuthFailure};
use super::models::{normalize_email, Account, LoginRequest};
use super::password::verify_password;
use super::routes::AuthState;

/// Check email and password, then mint a one day session token
///
/// The token carries the account's role flags as they are now; promotions
/// made later only apply after the next login.
pub fn login(state: &AuthState, req: LoginRequest) -> Result<(Account, String), ApiError> {
    let email = req.email.as_deref().map(normalize_email).unwrap_or_default();
    let password = req.password.unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Err(ApiError::validation("Please enter your email and password"));
    }

    let account = state
        .store
        .find_by_email(&email)?
        .ok_or_else(ApiError::user_not_found)?;

    let password_hash = account
        .password_hash
        .as_deref()
        .ok_or(ApiError::Auth(AuthFailure::FederatedOnly))?;
    if !verify_password(&password, password_hash)? {
        return Err(ApiError::Auth(AuthFailure::InvalidPassword));
    }

    let token = state
        .tokens
        .issue_session(&account.id, account.roles())
        .map_err(issue_error)?;
    log::info!("Account {} logged in", account.id);
    Ok((account, token))
}

pub fn list_accounts(state: &AuthState) -> Result<Vec<Account>, ApiError> {
    Ok(state.store.list()?)
}

/// Flip `admin` on; promoting an admin again is a conflict
pub fn promote_to_admin(state: &AuthState, account_id: &str) -> Result<Account, ApiError> {
    let mut account = state
        .store
        .find_by_id(account_id)?
        .ok_or_else(ApiError::user_not_found)?;

    if account.admin {
        return Err(ApiError::Conflict("User is already an admin".to_string()));
    }
    account.admin = true;
    if !state.store.save(&mut account)? {
        return Err(ApiError::user_not_found());
    }
    log::info!("Account {} promoted to admin", account.id);
    Ok(account)
}

/// Operator bootstrap: make an existing account super admin (and admin)
pub fn grant_super_admin(store: &CredentialStore, email: &str) -> Result<Account, ApiError> {
    let mut account = store
        .find_by_email(email)?
        .ok_or_else(ApiError::user_not_found)?;

    if account.super_admin {
        return Err(ApiError::Conflict("User is already a super admin".to_string()));
    }
    account.super_admin = true;
    account.admin = true;
    store.save(&mut account)?;
    log::info!("Account {} granted super admin", account.id);
    Ok(account)
}
