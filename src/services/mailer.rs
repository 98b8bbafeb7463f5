/// Outbound email delivery
///
/// The orchestrator only ever sees the `Mailer` trait; delivery is a
/// best-effort external effect and every send returns an explicit result the
/// caller must act on.
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AuthError, Result};

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a verification link for the given token.
    async fn send_verification(&self, email: &str, token: &str) -> Result<()>;

    /// Deliver a short-form 6-digit verification code.
    async fn send_verification_code(&self, email: &str, code: &str) -> Result<()>;

    /// Deliver a password reset link for the given token.
    async fn send_reset(&self, email: &str, token: &str) -> Result<()>;
}

/// SMTP-backed mailer. When no SMTP host is configured it runs in no-op mode
/// and only logs, which keeps local development working without a relay.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: Option<Arc<AsyncSmtpTransport<Tokio1Executor>>>,
    from: Mailbox,
    frontend_url: String,
}

impl SmtpMailer {
    pub fn from_config(config: &Config) -> Result<Self> {
        let from = config
            .smtp_from
            .parse::<Mailbox>()
            .map_err(|e| AuthError::Internal(format!("Invalid SMTP_FROM address: {}", e)))?;

        let transport = if config.smtp_host.trim().is_empty() {
            warn!("SMTP host not configured; mailer will operate in no-op mode");
            None
        } else {
            let mut builder =
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                    .map_err(|e| {
                        AuthError::Internal(format!("Failed to configure SMTP transport: {}", e))
                    })?
                    .port(config.smtp_port);

            if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password)
            {
                builder =
                    builder.credentials(Credentials::new(username.clone(), password.clone()));
            }

            Some(Arc::new(builder.build()))
        };

        Ok(Self {
            transport,
            from,
            frontend_url: config.frontend_url.trim_end_matches('/').to_string(),
        })
    }

    async fn send_mail(&self, recipient: &str, subject: &str, body: String) -> Result<()> {
        let Some(transport) = &self.transport else {
            info!(recipient = %recipient, subject = %subject, "SMTP disabled, skipping email");
            return Ok(());
        };

        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient
                .parse::<Mailbox>()
                .map_err(|e| AuthError::Validation(format!("Invalid email address: {}", e)))?)
            .subject(subject)
            .body(body)
            .map_err(|e| AuthError::Internal(format!("Failed to build email: {}", e)))?;

        transport
            .send(message)
            .await
            .map_err(|e| AuthError::EmailDispatch(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_verification(&self, email: &str, token: &str) -> Result<()> {
        let link = format!("{}/verify-email/{}", self.frontend_url, token);
        let body = format!(
            "Welcome!\n\nPlease click the following link to verify your email address:\n{}\n\nThis link will expire in 24 hours.\nIf you didn't create an account, please ignore this email.",
            link
        );
        self.send_mail(email, "Verify your email address", body).await
    }

    async fn send_verification_code(&self, email: &str, code: &str) -> Result<()> {
        let body = format!(
            "Your verification code is: {}\n\nThis code will expire in 10 minutes.\nIf you didn't request this verification code, please ignore this email.",
            code
        );
        self.send_mail(email, "Email Verification Code", body).await
    }

    async fn send_reset(&self, email: &str, token: &str) -> Result<()> {
        let link = format!("{}/reset-password/{}", self.frontend_url, token);
        let body = format!(
            "You requested a password reset. Please click the link below to reset your password:\n{}\n\nThis link will expire in 1 hour.\nIf you didn't request this, please ignore this email.",
            link
        );
        self.send_mail(email, "Password Reset Request", body).await
    }
}
