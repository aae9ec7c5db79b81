//! Email verification flow
//!
//! An account starts `Unverified` and moves to `Verified` exactly once, by
//! following an emailed link. Links embed a signed `verification` token;
//! replaying a still-valid link after verification is refused through the
//! account flag, since the token itself stays valid until it expires.

use super::email::{verification_email, MailError, VERIFICATION_SUBJECT, WELCOME_SUBJECT};
use super::error::{issue_error, link_error, ApiError};
use super::jwt::TokenError;
use super::models::{Account, RegisterRequest, TokenPurpose};
use super::password::hash_password;
use super::routes::AuthState;
use super::validation::{require_email, validate_registration};

/// Route that consumes a link without resending on expiry
pub const VERIFY_ROUTE: &str = "verify-user";
/// Route that resends a fresh link when the presented one has expired
pub const VERIFY_OR_RESEND_ROUTE: &str = "verify-or-resend";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationState {
    Unverified,
    Verified,
}

impl VerificationState {
    pub fn of(account: &Account) -> Self {
        if account.verified {
            VerificationState::Verified
        } else {
            VerificationState::Unverified
        }
    }

    /// The single transition; verifying twice is rejected rather than ignored
    pub fn verify(self) -> Result<Self, ApiError> {
        match self {
            VerificationState::Unverified => Ok(VerificationState::Verified),
            VerificationState::Verified => Err(ApiError::already_verified()),
        }
    }
}

/// Result of the verify-or-resend entry point
#[derive(Debug)]
pub enum AutoVerifyOutcome {
    Verified(Account),
    LinkResent,
}

impl AuthState {
    fn link(&self, route: &str, token: &str) -> String {
        format!("{}/{}/{}", self.app_url.trim_end_matches('/'), route, token)
    }

    async fn send_link(
        &self,
        account: &Account,
        subject: &str,
        route: &str,
        token: &str,
    ) -> Result<(), MailError> {
        let body = verification_email(account.first_name(), &self.link(route, token));
        self.mailer.send(&account.email, subject, &body).await
    }
}

/// Create an unverified account and email its first verification link
///
/// The account is kept even when the email cannot be sent; the user can ask
/// for a new link through resend.
pub async fn register(state: &AuthState, req: RegisterRequest) -> Result<Account, ApiError> {
    let new_account = validate_registration(req)?;

    if state.store.find_by_email(&new_account.email)?.is_some() {
        return Err(ApiError::Conflict(format!(
            "Email {} is already registered",
            new_account.email
        )));
    }

    let password_hash = hash_password(&new_account.password)?;
    let account = Account::new(&new_account.full_name, &new_account.email, Some(password_hash));
    state.store.create(&account)?;
    log::info!("Registered account {} <{}>", account.id, account.email);

    match state.tokens.issue_verification(&account.id) {
        Ok(token) => {
            if let Err(e) = state
                .send_link(&account, WELCOME_SUBJECT, VERIFY_ROUTE, &token)
                .await
            {
                log::error!("Failed to send verification email to {}: {}", account.email, e);
            }
        }
        Err(e) => log::error!("Failed to issue verification token for {}: {}", account.id, e),
    }

    Ok(account)
}

/// Consume a verification link
///
/// Expired links are reported as such and nothing is resent.
pub fn verify(state: &AuthState, token: &str) -> Result<Account, ApiError> {
    let claims = state
        .tokens
        .verify(token, TokenPurpose::Verification)
        .map_err(link_error)?;
    mark_verified(state, &claims.sub)
}

/// Issue and email a fresh 30 minute link to an existing, unverified account
pub async fn resend(state: &AuthState, email: Option<&str>) -> Result<Account, ApiError> {
    let email = require_email(email, "Please enter your email")?;
    let account = state
        .store
        .find_by_email(&email)?
        .ok_or_else(ApiError::user_not_found)?;
    VerificationState::of(&account).verify()?;

    let token = state.tokens.issue_resend(&account.id).map_err(issue_error)?;
    state
        .send_link(&account, VERIFICATION_SUBJECT, VERIFY_ROUTE, &token)
        .await?;
    log::info!("Resent verification link to {}", account.email);

    Ok(account)
}

/// Verify, or on an expired link send a new one within the same request
pub async fn verify_or_resend(state: &AuthState, token: &str) -> Result<AutoVerifyOutcome, ApiError> {
    let claims = match state.tokens.verify(token, TokenPurpose::Verification) {
        Ok(claims) => {
            let account = mark_verified(state, &claims.sub)?;
            return Ok(AutoVerifyOutcome::Verified(account));
        }
        Err(TokenError::Expired) => state
            .tokens
            .decode_expired(token, TokenPurpose::Verification)
            .map_err(link_error)?,
        Err(e) => return Err(link_error(e)),
    };

    let account = state
        .store
        .find_by_id(&claims.sub)?
        .ok_or_else(ApiError::user_not_found)?;
    VerificationState::of(&account).verify()?;

    let fresh = state.tokens.issue_resend(&account.id).map_err(issue_error)?;
    state
        .send_link(&account, VERIFICATION_SUBJECT, VERIFY_OR_RESEND_ROUTE, &fresh)
        .await?;
    log::info!("Expired link for {}, sent a new one", account.email);

    Ok(AutoVerifyOutcome::LinkResent)
}

fn mark_verified(state: &AuthState, account_id: &str) -> Result<Account, ApiError> {
    let mut account = state
        .store
        .find_by_id(account_id)?
        .ok_or_else(ApiError::user_not_found)?;

    VerificationState::of(&account).verify()?;
    account.verified = true;
    if !state.store.save(&mut account)? {
        return Err(ApiError::user_not_found());
    }
    log::info!("Verified account {}", account.id);
    Ok(account)
}
