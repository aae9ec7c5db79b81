//! Account, token claim and request/response types

use serde::{Deserialize, Serialize};

/// Back office account
///
/// Serialized with the field names the front desk client already consumes.
/// The password hash is never serialized.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub email: String,
    /// `None` for accounts created through Google sign-in
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    #[serde(rename = "isVerified")]
    pub verified: bool,
    #[serde(rename = "isAdmin")]
    pub admin: bool,
    #[serde(rename = "isSuperAdmin")]
    pub super_admin: bool,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

impl Account {
    /// New unverified account with a fresh id
    pub fn new(full_name: &str, email: &str, password_hash: Option<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            full_name: full_name.to_string(),
            email: normalize_email(email),
            password_hash,
            verified: false,
            admin: false,
            super_admin: false,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// First word of the display name, used to greet the user in emails
    pub fn first_name(&self) -> &str {
        self.full_name.split_whitespace().next().unwrap_or(&self.full_name)
    }

    /// Roles as they are embedded into session tokens
    pub fn roles(&self) -> RoleClaims {
        RoleClaims {
            admin: self.admin,
            super_admin: self.super_admin,
            verified: self.verified,
        }
    }
}

/// Lowercase and trim an email for storage and lookups
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// What a token may be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    Verification,
    Session,
    #[serde(rename = "oauth_state")]
    OAuthState,
}

impl TokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::Verification => "verification",
            TokenPurpose::Session => "session",
            TokenPurpose::OAuthState => "oauth_state",
        }
    }
}

/// Account flags captured at issuance time
///
/// A role change only shows up in a session once a new token is issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleClaims {
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub super_admin: bool,
    #[serde(default)]
    pub verified: bool,
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // account id
    pub purpose: TokenPurpose,
    #[serde(flatten)]
    pub roles: RoleClaims,
    pub exp: u64,
    pub iat: u64,
}

/// Identity attached to a request by the authentication middleware
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub claims: Claims,
}

impl AuthenticatedUser {
    pub fn account_id(&self) -> &str {
        &self.claims.sub
    }

    pub fn is_admin(&self) -> bool {
        self.claims.roles.admin
    }

    pub fn is_super_admin(&self) -> bool {
        self.claims.roles.super_admin
    }
}

/// Profile handed over by the identity provider after a successful handshake
#[derive(Debug, Clone)]
pub struct FederatedProfile {
    pub email: String,
    pub display_name: String,
    pub email_verified: bool,
}

/// API request/response types
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(rename = "fullName", default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(rename = "confirmPassword", default)]
    pub confirm_password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResendVerificationRequest {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub message: String,
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub data: Account,
    pub token: String,
}

/// Google redirect parameters
#[derive(Debug, Deserialize)]
pub struct OAuthCallback {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_serialization_hides_password() {
        let account = Account::new("Ada Lovelace", "Ada@Example.com", Some("hash".to_string()));
        let json = serde_json::to_value(&account).unwrap();

        assert!(json.get("password_hash").is_none());
        assert_eq!(json["fullName"], "Ada Lovelace");
        assert_eq!(json["email"], "ada@example.com");
        assert_eq!(json["isVerified"], false);
        assert_eq!(json["isAdmin"], false);
        assert_eq!(json["isSuperAdmin"], false);
    }

    #[test]
    fn test_first_name() {
        let account = Account::new("Grace Brewster Hopper", "grace@example.com", None);
        assert_eq!(account.first_name(), "Grace");
    }

    #[test]
    fn test_claims_flatten_roles() {
        let claims = Claims {
            sub: "acc_1".to_string(),
            purpose: TokenPurpose::Session,
            roles: RoleClaims {
                admin: true,
                super_admin: false,
                verified: true,
            },
            exp: 10,
            iat: 1,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["admin"], true);
        assert_eq!(json["purpose"], "session");

        let back: Claims = serde_json::from_value(json).unwrap();
        assert!(back.roles.admin);
        assert!(!back.roles.super_admin);
    }
}
