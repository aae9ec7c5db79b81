//! Google sign-in
//!
//! The authorization redirect, code exchange and profile fetch. Turning the
//! profile into a local account lives in `federation`.

use oauth2::{
    basic::BasicClient, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken,
    EndpointNotSet, EndpointSet, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use reqwest::Client as HttpClient;
use serde::Deserialize;

use super::models::FederatedProfile;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

type GoogleClient = BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("Google sign-in is not configured")]
    NotConfigured,

    #[error("invalid OAuth url: {0}")]
    Url(#[from] oauth2::url::ParseError),

    #[error("token exchange failed: {0}")]
    Exchange(String),

    #[error("failed to fetch Google profile: {0}")]
    Profile(#[from] reqwest::Error),

    #[error("Google profile has no email address")]
    MissingEmail,

    #[error("provider returned an error: {0}")]
    Denied(String),
}

/// Google client credentials
#[derive(Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

impl GoogleConfig {
    pub fn from_env(app_url: &str) -> Option<Self> {
        Some(Self {
            client_id: std::env::var("GOOGLE_CLIENT_ID").ok()?,
            client_secret: std::env::var("GOOGLE_CLIENT_SECRET").ok()?,
            redirect_url: std::env::var("GOOGLE_REDIRECT_URL").unwrap_or_else(|_| {
                format!("{}/auth/google/login", app_url.trim_end_matches('/'))
            }),
        })
    }
}

/// Google OAuth manager
pub struct GoogleOAuth {
    config: Option<GoogleConfig>,
    http_client: HttpClient,
}

impl GoogleOAuth {
    pub fn new(config: Option<GoogleConfig>) -> Self {
        // Redirects are not followed during the token exchange.
        let http_client = HttpClient::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_else(|e| {
                log::warn!("Falling back to default HTTP client: {}", e);
                HttpClient::new()
            });
        Self {
            config,
            http_client,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    /// Consent screen URL carrying our own `state` value
    pub fn authorize_url(&self, state: &str) -> Result<String, OAuthError> {
        let client = self.create_client()?;
        let state = state.to_string();

        let (url, _csrf) = client
            .authorize_url(move || CsrfToken::new(state))
            .add_scope(Scope::new("openid".to_string()))
            .add_scope(Scope::new("email".to_string()))
            .add_scope(Scope::new("profile".to_string()))
            .url();
        Ok(url.to_string())
    }

    /// Exchange authorization code for the Google profile
    pub async fn exchange_code(&self, code: &str) -> Result<FederatedProfile, OAuthError> {
        let client = self.create_client()?;

        let token_result = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http_client)
            .await
            .map_err(|e| OAuthError::Exchange(e.to_string()))?;

        self.fetch_profile(token_result.access_token().secret()).await
    }

    fn create_client(&self) -> Result<GoogleClient, OAuthError> {
        let config = self.config.as_ref().ok_or(OAuthError::NotConfigured)?;

        Ok(BasicClient::new(ClientId::new(config.client_id.clone()))
            .set_client_secret(ClientSecret::new(config.client_secret.clone()))
            .set_auth_uri(AuthUrl::new(GOOGLE_AUTH_URL.to_string())?)
            .set_token_uri(TokenUrl::new(GOOGLE_TOKEN_URL.to_string())?)
            .set_redirect_uri(RedirectUrl::new(config.redirect_url.clone())?))
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<FederatedProfile, OAuthError> {
        #[derive(Deserialize)]
        struct GoogleUser {
            email: Option<String>,
            #[serde(default)]
            email_verified: bool,
            name: Option<String>,
        }

        let user: GoogleUser = self
            .http_client
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let email = user.email.ok_or(OAuthError::MissingEmail)?;
        let display_name = user.name.unwrap_or_else(|| {
            email.split('@').next().unwrap_or("Google Guest").to_string()
        });

        Ok(FederatedProfile {
            email,
            display_name,
            email_verified: user.email_verified,
        })
    }
}
