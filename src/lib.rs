//! # Hotel Back Office
//!
//! Account and access layer for a hotel booking back office.
//!
//! ## Features
//!
//! - **Registration**: validated sign-up with emailed verification links
//! - **Sessions**: password login issuing signed, role-carrying tokens
//! - **Roles**: admin and super admin gates, promotion by a super admin
//! - **Google sign-in**: OAuth handshake mapped onto local accounts
//!
//! ## Usage
//!
//! ```rust,no_run
//! use hotel_backoffice::{
//!     auth::AuthState,
//!     servers::{ApiServer, ApiServerConfig},
//! };
//! use std::sync::Arc;
//!
//! # async fn run() -> hotel_backoffice::Result<()> {
//! let state = Arc::new(AuthState::from_env("data/backoffice.db")?);
//! ApiServer::new(ApiServerConfig::default(), state).start().await
//! # }
//! ```

// ============================================================================
// PUBLIC API MODULES
// ============================================================================

/// Accounts, verification, sessions and roles
pub mod auth;

/// HTTP server
pub mod servers;

/// Logger setup
pub mod logging;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use auth::{auth_router, ApiError, AuthState};
pub use servers::{ApiServer, ApiServerConfig};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Startup and operator-command failures
#[derive(Debug, thiserror::Error)]
pub enum BackofficeError {
    #[error("Store error: {0}")]
    Store(#[from] auth::StoreError),

    #[error("Token error: {0}")]
    Token(#[from] auth::TokenError),

    #[error("Logging error: {0}")]
    Logging(#[from] flexi_logger::FlexiLoggerError),

    #[error("Request error: {0}")]
    Api(#[from] auth::ApiError),

    #[error("Server error: {0}")]
    Server(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, BackofficeError>;

// ============================================================================
// LIBRARY VERSION INFO
// ============================================================================

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Library description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
