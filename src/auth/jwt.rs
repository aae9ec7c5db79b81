//! JWT token handling

use chrono::Duration;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};

use super::models::{Claims, RoleClaims, TokenPurpose};

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("JWT_SECRET is not set")]
    MissingSecret,

    #[error("token expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("{key} must be a positive whole number within range, got {value:?}")]
    InvalidLifetime { key: String, value: String },

    #[error("failed to sign token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),
}

/// JWT configuration
#[derive(Clone)]
pub struct TokenConfig {
    secret: String,
    pub verification_ttl: Duration,
    pub resend_ttl: Duration,
    pub session_ttl: Duration,
    pub oauth_state_ttl: Duration,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("verification_ttl", &self.verification_ttl)
            .field("resend_ttl", &self.resend_ttl)
            .field("session_ttl", &self.session_ttl)
            .finish()
    }
}

impl TokenConfig {
    /// Default lifetimes: 10 minute registration links, 30 minute resent links, 1 day sessions
    pub fn new(secret: impl Into<String>) -> Result<Self, TokenError> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(TokenError::MissingSecret);
        }
        Ok(Self {
            secret,
            verification_ttl: Duration::minutes(10),
            resend_ttl: Duration::minutes(30),
            session_ttl: Duration::hours(24),
            oauth_state_ttl: Duration::minutes(10),
        })
    }

    pub fn from_env() -> Result<Self, TokenError> {
        let secret = std::env::var("JWT_SECRET").map_err(|_| TokenError::MissingSecret)?;
        let mut config = Self::new(secret)?;

        if let Ok(value) = std::env::var("VERIFICATION_TOKEN_MINUTES") {
            config.verification_ttl =
                lifetime("VERIFICATION_TOKEN_MINUTES", &value, Duration::try_minutes)?;
        }
        if let Ok(value) = std::env::var("RESEND_TOKEN_MINUTES") {
            config.resend_ttl = lifetime("RESEND_TOKEN_MINUTES", &value, Duration::try_minutes)?;
        }
        if let Ok(value) = std::env::var("SESSION_TOKEN_HOURS") {
            config.session_ttl = lifetime("SESSION_TOKEN_HOURS", &value, Duration::try_hours)?;
        }
        Ok(config)
    }
}

/// Parse a lifetime setting; zero, negative and overflowing values are rejected
fn lifetime(key: &str, value: &str, unit: fn(i64) -> Option<Duration>) -> Result<Duration, TokenError> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|amount| *amount > 0)
        .and_then(unit)
        .ok_or_else(|| TokenError::InvalidLifetime {
            key: key.to_string(),
            value: value.to_string(),
        })
}

/// Issues and checks signed tokens for every purpose in the back office
#[derive(Clone)]
pub struct TokenService {
    config: TokenConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    pub fn new(config: TokenConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Sign a token for `subject` that expires `ttl` from now
    pub fn issue(
        &self,
        subject: &str,
        purpose: TokenPurpose,
        roles: RoleClaims,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let now = chrono::Utc::now().timestamp();
        let expiration = (now + ttl.num_seconds()).max(0);

        let claims = Claims {
            sub: subject.to_string(),
            purpose,
            roles,
            exp: expiration as u64,
            iat: now.max(0) as u64,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Encode)
    }

    /// Verification link token for a freshly registered account
    pub fn issue_verification(&self, account_id: &str) -> Result<String, TokenError> {
        self.issue(
            account_id,
            TokenPurpose::Verification,
            RoleClaims::default(),
            self.config.verification_ttl,
        )
    }

    /// Verification link token handed out on resend, which lives longer
    pub fn issue_resend(&self, account_id: &str) -> Result<String, TokenError> {
        self.issue(
            account_id,
            TokenPurpose::Verification,
            RoleClaims::default(),
            self.config.resend_ttl,
        )
    }

    pub fn issue_session(&self, account_id: &str, roles: RoleClaims) -> Result<String, TokenError> {
        self.issue(account_id, TokenPurpose::Session, roles, self.config.session_ttl)
    }

    /// CSRF state for the Google handshake, checked again on the callback
    pub fn issue_oauth_state(&self) -> Result<String, TokenError> {
        let nonce = uuid::Uuid::new_v4().to_string();
        self.issue(
            &nonce,
            TokenPurpose::OAuthState,
            RoleClaims::default(),
            self.config.oauth_state_ttl,
        )
    }

    /// Check signature, expiry and purpose
    ///
    /// Expiry is reported apart from every other failure so callers can point
    /// the user at a resend or a fresh login.
    pub fn verify(&self, token: &str, purpose: TokenPurpose) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation(true))
            .map(|data| data.claims)
            .map_err(classify)?;
        ensure_purpose(claims, purpose)
    }

    /// Recover the claims of an expired token
    ///
    /// Only the expiry check is skipped; a token with a bad signature is still
    /// rejected. Used by the verification flow to find the account behind an
    /// expired link.
    pub fn decode_expired(&self, token: &str, purpose: TokenPurpose) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation(false))
            .map(|data| data.claims)
            .map_err(classify)?;
        ensure_purpose(claims, purpose)
    }

    fn validation(&self, validate_exp: bool) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = validate_exp;
        validation
    }
}

fn classify(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid(err.to_string()),
    }
}

fn ensure_purpose(claims: Claims, purpose: TokenPurpose) -> Result<Claims, TokenError> {
    if claims.purpose != purpose {
        return Err(TokenError::Invalid(format!(
            "expected a {} token, got {}",
            purpose.as_str(),
            claims.purpose.as_str()
        )));
    }
    Ok(claims)
}
