use super::database::CredentialStore;
use super::email::{EmailSender, MockEmailService};
use super::jwt::{TokenConfig, TokenService};
use super::oauth::GoogleOAuth;
use super::routes::AuthState;

/// In-memory state with a mock mailer and no Google credentials
pub fn test_state(mailer: MockEmailService) -> AuthState {
    AuthState::new(
        CredentialStore::in_memory().unwrap(),
        TokenService::new(TokenConfig::new("test-secret").unwrap()),
        GoogleOAuth::new(None),
        EmailSender::Mock(mailer),
        "http://localhost:4060",
    )
}

/// Pull the token out of the first `/{route}/<token>` link in an email body
pub fn link_token(html: &str, route: &str) -> String {
    let marker = format!("/{}/", route);
    let start = html.find(&marker).expect("link not found") + marker.len();
    html[start..]
        .chars()
        .take_while(|c| *c != '"' && *c != '<')
        .collect()
}
