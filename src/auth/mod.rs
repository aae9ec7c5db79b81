//! Account and authentication module
//!
//! - Registration with email verification links
//! - Password login with role-carrying session tokens
//! - Admin / super admin gates
//! - Google sign-in

pub mod accounts;
pub mod database;
pub mod email;
pub mod error;
pub mod federation;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod oauth;
pub mod password;
pub mod routes;
pub mod validation;
pub mod verification;

#[cfg(test)]
mod test_support;

pub use database::{CredentialStore, StoreError};
pub use email::{EmailSender, MockEmailService};
pub use error::{ApiError, AuthFailure};
pub use jwt::{TokenConfig, TokenError, TokenService};
pub use models::*;
pub use oauth::{GoogleConfig, GoogleOAuth};
pub use routes::{auth_router, AuthState};
