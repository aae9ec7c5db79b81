//! End-to-end scenarios through the full HTTP router

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use hotel_backoffice::auth::{
    accounts, auth_router, AuthState, CredentialStore, EmailSender, GoogleOAuth, MockEmailService,
    RoleClaims, TokenConfig, TokenPurpose, TokenService,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct TestApp {
    state: Arc<AuthState>,
    mailer: MockEmailService,
}

impl TestApp {
    fn new() -> Self {
        let mailer = MockEmailService::new();
        let state = AuthState::new(
            CredentialStore::in_memory().unwrap(),
            TokenService::new(TokenConfig::new("integration-secret").unwrap()),
            GoogleOAuth::new(None),
            EmailSender::Mock(mailer.clone()),
            "http://localhost:4060",
        );
        Self {
            state: Arc::new(state),
            mailer,
        }
    }

    fn router(&self) -> Router {
        auth_router(self.state.clone())
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn register(&self, name: &str, email: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/register",
            Some(json!({ "fullName": name, "email": email, "password": "Pass1!" })),
            None,
        )
        .await
    }

    async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/login",
            Some(json!({ "email": email, "password": password })),
            None,
        )
        .await
    }

    /// Path of the verification link in the n-th email sent
    fn link_path(&self, index: usize) -> String {
        let sent = self.mailer.sent();
        let body = &sent[index].html_body;
        let start = body.find("http://localhost:4060").unwrap() + "http://localhost:4060".len();
        body[start..].chars().take_while(|c| *c != '"').collect()
    }
}

#[tokio::test]
async fn test_register_then_verify_once() {
    let app = TestApp::new();

    let (status, body) = app.register("Name", "a@x.com").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "User created successfully");
    assert_eq!(body["data"]["isVerified"], false);
    assert!(body["data"].get("password").is_none());
    assert!(body["data"].get("password_hash").is_none());

    let link = app.link_path(0);
    assert!(link.starts_with("/verify-user/"));

    let (status, body) = app.send(Method::GET, &link, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isVerified"], true);

    let (status, body) = app.send(Method::GET, &link, None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User already verified, Please proceed to login");
}

#[tokio::test]
async fn test_register_validation() {
    let app = TestApp::new();

    let (status, body) = app
        .send(
            Method::POST,
            "/register",
            Some(json!({ "fullName": "Al", "email": "bad", "password": "weak" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");
    assert!(body["errors"].as_array().unwrap().len() >= 3);

    let (status, _) = app.send(Method::POST, "/register", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    app.register("Name", "dup@x.com").await;
    let (status, _) = app.register("Other Name", "Dup@X.com").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_outcomes() {
    let app = TestApp::new();
    app.register("Front Desk", "desk@x.com").await;

    let (status, body) = app.login("ghost@x.com", "Pass1!").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");

    let (status, body) = app.login("desk@x.com", "Wrong1!").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid password");

    let (status, body) = app.login("desk@x.com", "Pass1!").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successfully");
    assert_eq!(body["data"]["email"], "desk@x.com");
    assert!(body["data"].get("password_hash").is_none());

    let token = body["token"].as_str().unwrap();
    let claims = app.state.tokens.verify(token, TokenPurpose::Session).unwrap();
    assert_eq!(claims.exp - claims.iat, 24 * 3600);

    let (status, body) = app
        .send(Method::POST, "/login", Some(json!({ "email": "desk@x.com" })), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0], "Please enter your email and password");
}

#[tokio::test]
async fn test_promotion_requires_super_admin() {
    let app = TestApp::new();
    let (_, staff) = app.register("Staff Member", "staff@x.com").await;
    let staff_id = staff["data"]["id"].as_str().unwrap().to_string();
    app.register("Hotel Owner", "owner@x.com").await;
    accounts::grant_super_admin(&app.state.store, "owner@x.com").unwrap();

    let uri = format!("/users/{}", staff_id);

    let (status, body) = app.send(Method::PATCH, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Access denied, token must be provided");

    let (_, staff_login) = app.login("staff@x.com", "Pass1!").await;
    let staff_token = staff_login["token"].as_str().unwrap().to_string();
    let (status, _) = app.send(Method::PATCH, &uri, None, Some(staff_token.as_str())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, owner_login) = app.login("owner@x.com", "Pass1!").await;
    let owner_token = owner_login["token"].as_str().unwrap().to_string();
    let (status, body) = app.send(Method::PATCH, &uri, None, Some(owner_token.as_str())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User Staff Member is now an admin");
    assert_eq!(body["data"]["isAdmin"], true);

    let (status, body) = app.send(Method::PATCH, &uri, None, Some(owner_token.as_str())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User is already an admin");

    let (status, _) = app
        .send(Method::PATCH, "/users/unknown", None, Some(owner_token.as_str()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_roles_come_from_the_token() {
    let app = TestApp::new();
    app.register("Night Manager", "night@x.com").await;

    // token minted before the grant still carries the old roles
    let (_, before) = app.login("night@x.com", "Pass1!").await;
    let stale = before["token"].as_str().unwrap().to_string();
    accounts::grant_super_admin(&app.state.store, "night@x.com").unwrap();

    let (status, _) = app
        .send(Method::PATCH, "/users/anyone", None, Some(stale.as_str()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_expired_session() {
    let app = TestApp::new();
    let (_, owner) = app.register("Hotel Owner", "owner@x.com").await;
    let owner_id = owner["data"]["id"].as_str().unwrap();

    let expired = app
        .state
        .tokens
        .issue(
            owner_id,
            TokenPurpose::Session,
            RoleClaims {
                super_admin: true,
                admin: true,
                verified: true,
            },
            chrono::Duration::seconds(-5),
        )
        .unwrap();

    let (status, body) = app
        .send(Method::PATCH, &format!("/users/{}", owner_id), None, Some(expired.as_str()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Session timed-out, please login to continue");
}

#[tokio::test]
async fn test_list_users_hides_secrets() {
    let app = TestApp::new();
    app.register("First Guest", "one@x.com").await;
    app.register("Second Guest", "two@x.com").await;

    let (status, body) = app.send(Method::GET, "/users", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Users fetched successfully");

    let users = body["data"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    for user in users {
        assert!(user.get("password_hash").is_none());
        assert!(user.get("password").is_none());
    }
}

#[tokio::test]
async fn test_resend_verification() {
    let app = TestApp::new();
    app.register("Late Guest", "late@x.com").await;

    let (status, body) = app
        .send(Method::GET, "/resend-verification", Some(json!({})), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0], "Please enter your email");

    let (status, _) = app
        .send(
            Method::GET,
            "/resend-verification",
            Some(json!({ "email": "nobody@x.com" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .send(
            Method::GET,
            "/resend-verification",
            Some(json!({ "email": "late@x.com" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Verification link sent successfully");

    let link = app.link_path(1);
    let (status, _) = app.send(Method::GET, &link, None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_verify_or_resend_on_expired_link() {
    let app = TestApp::new();
    let (_, created) = app.register("Late Guest", "late@x.com").await;
    let id = created["data"]["id"].as_str().unwrap();

    let expired = app
        .state
        .tokens
        .issue(
            id,
            TokenPurpose::Verification,
            RoleClaims::default(),
            chrono::Duration::minutes(-1),
        )
        .unwrap();

    let (status, body) = app
        .send(Method::GET, &format!("/verify-user/{}", expired), None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Verification link expired: Please resend a new verification link"
    );
    assert_eq!(app.mailer.sent().len(), 1);

    let (status, body) = app
        .send(Method::GET, &format!("/verify-or-resend/{}", expired), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        "Link expired: A new verification link has been sent to your email"
    );

    let link = app.link_path(1);
    assert!(link.starts_with("/verify-or-resend/"));
    let (status, body) = app.send(Method::GET, &link, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isVerified"], true);
}

#[tokio::test]
async fn test_session_token_is_not_a_verification_link() {
    let app = TestApp::new();
    app.register("Guest", "guest@x.com").await;
    let (_, login) = app.login("guest@x.com", "Pass1!").await;
    let token = login["token"].as_str().unwrap();

    let (status, _) = app
        .send(Method::GET, &format!("/verify-user/{}", token), None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_google_routes_without_credentials() {
    let app = TestApp::new();

    let (status, body) = app.send(Method::GET, "/googleAuthenticate", None, None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["message"], "Google sign-in failed");

    let (status, _) = app
        .send(Method::GET, "/auth/google/login?code=abc&state=forged", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
