//! Email sending for verification links

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::{Arc, Mutex};

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("smtp: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("mock mailer rejected message to {0}")]
    Rejected(String),
}

/// Email configuration
#[derive(Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_email: String,
    pub from_name: String,
}

impl EmailConfig {
    pub fn from_env() -> Option<Self> {
        Some(Self {
            smtp_host: std::env::var("SMTP_HOST").ok()?,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(587),
            smtp_username: std::env::var("SMTP_USERNAME").ok()?,
            smtp_password: std::env::var("SMTP_PASSWORD").ok()?,
            from_email: std::env::var("FROM_EMAIL").ok()?,
            from_name: std::env::var("FROM_NAME")
                .unwrap_or_else(|_| "Hotel Back Office".to_string()),
        })
    }
}

/// Email service
pub struct EmailService {
    config: EmailConfig,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Result<Self, MailError> {
        let creds = Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(creds)
            .build();

        Ok(Self { config, mailer })
    }

    pub async fn send(&self, to_email: &str, subject: &str, html_body: &str) -> Result<(), MailError> {
        let from: Mailbox = format!("{} <{}>", self.config.from_name, self.config.from_email).parse()?;

        let email = Message::builder()
            .from(from)
            .to(to_email.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())?;

        self.mailer.send(email).await?;
        Ok(())
    }
}

/// A message captured by the mock mailer
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Mock email service for development/testing
///
/// Logs every message and keeps it in an outbox so tests can follow the links.
#[derive(Clone, Default)]
pub struct MockEmailService {
    outbox: Arc<Mutex<Vec<OutgoingEmail>>>,
    fail: bool,
}

impl MockEmailService {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every delivery fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub async fn send(&self, to_email: &str, subject: &str, html_body: &str) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::Rejected(to_email.to_string()));
        }
        log::info!("[MOCK EMAIL] {} -> {}", subject, to_email);
        log::debug!("[MOCK EMAIL] body: {}", html_body);
        if let Ok(mut outbox) = self.outbox.lock() {
            outbox.push(OutgoingEmail {
                to: to_email.to_string(),
                subject: subject.to_string(),
                html_body: html_body.to_string(),
            });
        }
        Ok(())
    }

    /// Messages sent so far
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.outbox.lock().map(|o| o.clone()).unwrap_or_default()
    }
}

/// Unified email sender
pub enum EmailSender {
    Real(EmailService),
    Mock(MockEmailService),
}

impl EmailSender {
    pub fn from_env() -> Self {
        match EmailConfig::from_env() {
            Some(config) => match EmailService::new(config) {
                Ok(service) => EmailSender::Real(service),
                Err(e) => {
                    log::warn!("Failed to initialize email service: {}. Using mock.", e);
                    EmailSender::Mock(MockEmailService::new())
                }
            },
            None => {
                log::info!("Email not configured. Using mock email service.");
                EmailSender::Mock(MockEmailService::new())
            }
        }
    }

    pub async fn send(&self, to_email: &str, subject: &str, html_body: &str) -> Result<(), MailError> {
        match self {
            EmailSender::Real(service) => service.send(to_email, subject, html_body).await,
            EmailSender::Mock(mock) => mock.send(to_email, subject, html_body).await,
        }
    }
}

pub const WELCOME_SUBJECT: &str = "Welcome to Hotel Back Office";
pub const VERIFICATION_SUBJECT: &str = "Verification Link";

/// HTML body for a verification link
pub fn verification_email(first_name: &str, link: &str) -> String {
    format!(
        r#"<div style="font-family: Arial, sans-serif; margin: 0; padding: 0;">
    <div style="width: 100%; background-color: #f2f2f2;">
        <div style="margin: 0 auto; max-width: 600px; background-color: #ffffff;">
            <div style="background-color: #4CAF50; padding: 10px 0; text-align: center;">
                <h2 style="color: white;">Hotel Back Office</h2>
            </div>
            <div style="padding: 20px;">
                <h3>Hi {first_name},</h3>
                <p>Thank you for signing up. Please click the link below to verify your email address.</p>
                <a href="{link}" style="background-color: #4CAF50; color: white; padding: 10px 20px; text-decoration: none;">Verify Email</a>
                <p style="word-break: break-all; color: #666;">{link}</p>
            </div>
        </div>
    </div>
</div>"#
    )
}
