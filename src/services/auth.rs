/// Auth orchestrator
///
/// Coordinates the account store, token lifecycle, credential hashing,
/// session issue, and email delivery across the seven authentication flows.
/// Collaborators are injected so tests can substitute fakes.
use std::sync::Arc;
use tracing::{error, info, warn};
use validator::Validate;

use crate::db::{AccountStore, SecretKind};
use crate::error::{AuthError, Result};
use crate::models::account::{
    ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse, RegisterRequest,
    RegisterResponse, ResendVerificationRequest, ResetPasswordRequest, VerifyCodeRequest,
};
use crate::models::{AccountSummary, NewAccount, VerificationMethod};
use crate::security::{hash_password, verify_password, SessionIssuer};
use crate::services::mailer::Mailer;
use crate::services::tokens::TokenManager;

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn AccountStore>,
    mailer: Arc<dyn Mailer>,
    tokens: TokenManager,
    sessions: SessionIssuer,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn AccountStore>,
        mailer: Arc<dyn Mailer>,
        sessions: SessionIssuer,
    ) -> Self {
        let tokens = TokenManager::new(store.clone());
        Self {
            store,
            mailer,
            tokens,
            sessions,
        }
    }

    /// Register a new account and send the verification email.
    ///
    /// Verification-first: no session is issued here. If the email cannot be
    /// sent, the account created in this request is deleted so no row is
    /// left holding a secret nobody received.
    pub async fn register(&self, mut payload: RegisterRequest) -> Result<RegisterResponse> {
        // Normalize before validating so padded or cased emails pass the
        // format check and land on the canonical spelling, and so a
        // whitespace-only name cannot slip past the length check.
        payload.email = normalize_email(&payload.email);
        payload.name = payload.name.trim().to_string();
        payload
            .validate()
            .map_err(|e| AuthError::Validation(e.to_string()))?;

        let email = payload.email.clone();
        let password_hash = hash_password(&payload.password)?;

        let account = self
            .store
            .create_unique(NewAccount {
                email: email.clone(),
                password_hash,
                name: payload.name,
                role: payload.role.unwrap_or_default(),
                phone_number: payload.phone_number,
                address: payload.address,
            })
            .await?;

        let method = payload.verification.unwrap_or_default();
        let send_result = match method {
            VerificationMethod::Link => {
                let token = self.tokens.issue_verification_link(account.id).await?;
                self.mailer.send_verification(&email, &token).await
            }
            VerificationMethod::Code => {
                let code = self.tokens.issue_verification_code(account.id).await?;
                self.mailer.send_verification_code(&email, &code).await
            }
        };

        if let Err(err) = send_result {
            warn!(
                account_id = %account.id,
                email = %mask_email(&email),
                "Verification email failed, rolling back registration"
            );
            // The dispatch failure is what the client must hear about; a
            // failed compensating delete is logged, not surfaced in its place.
            if let Err(delete_err) = self.store.delete(account.id).await {
                error!(
                    account_id = %account.id,
                    error = %delete_err,
                    "Failed to roll back account after email failure"
                );
            }
            return Err(err);
        }

        info!(account_id = %account.id, email = %mask_email(&email), "Account registered");

        Ok(RegisterResponse {
            message: "Registration successful. Please check your email to verify your account."
                .to_string(),
            account: AccountSummary::from(&account),
        })
    }

    /// Consume a verification link token and mark the account verified.
    pub async fn verify_email(&self, token: &str) -> Result<MessageResponse> {
        let account = self
            .tokens
            .consume_verification_link(token)
            .await?
            .ok_or(AuthError::InvalidOrExpiredToken)?;

        info!(account_id = %account.id, "Email verified");

        Ok(MessageResponse {
            message: "Email verified successfully".to_string(),
        })
    }

    /// Consume a 6-digit verification code, jointly matched on the email.
    pub async fn verify_code(&self, payload: VerifyCodeRequest) -> Result<MessageResponse> {
        if payload.email.is_empty() || payload.code.is_empty() {
            return Err(AuthError::Validation(
                "Email and verification code are required".to_string(),
            ));
        }

        let email = normalize_email(&payload.email);
        let account = self
            .tokens
            .consume_verification_code(&email, &payload.code)
            .await?
            .ok_or(AuthError::InvalidOrExpiredToken)?;

        info!(account_id = %account.id, "Email verified by code");

        Ok(MessageResponse {
            message: "Email verified successfully".to_string(),
        })
    }

    /// Verify credentials and issue a session token.
    ///
    /// Unknown email and wrong password produce the same generic error; this
    /// flow never reveals which field was wrong.
    pub async fn login(&self, payload: LoginRequest) -> Result<LoginResponse> {
        if payload.email.is_empty() || payload.password.is_empty() {
            return Err(AuthError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        let email = normalize_email(&payload.email);
        let account = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(&payload.password, &account.password_hash)?;

        let token = self.sessions.issue(account.id)?;

        info!(account_id = %account.id, "Login succeeded");

        Ok(LoginResponse {
            token,
            account: AccountSummary::from(&account),
        })
    }

    /// Issue a reset token and email it. This flow intentionally reveals
    /// whether an account exists, matching the upstream product behavior.
    pub async fn forgot_password(
        &self,
        payload: ForgotPasswordRequest,
    ) -> Result<MessageResponse> {
        if payload.email.is_empty() {
            return Err(AuthError::Validation("Email is required".to_string()));
        }

        let email = normalize_email(&payload.email);
        let account = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        let token = self.tokens.issue_reset(account.id).await?;

        if let Err(err) = self.mailer.send_reset(&email, &token).await {
            warn!(
                account_id = %account.id,
                email = %mask_email(&email),
                "Reset email failed, clearing reset secret"
            );
            self.tokens.clear(account.id, SecretKind::Reset).await?;
            return Err(err);
        }

        info!(account_id = %account.id, "Password reset email sent");

        Ok(MessageResponse {
            message: "Password reset link has been sent to your email".to_string(),
        })
    }

    /// Consume a reset token and replace the password in one operation.
    pub async fn reset_password(&self, payload: ResetPasswordRequest) -> Result<MessageResponse> {
        if payload.token.is_empty() || payload.password.is_empty() {
            return Err(AuthError::Validation(
                "Token and new password are required".to_string(),
            ));
        }

        // Hash (and length-check) the new password before touching the
        // token, so an invalid password does not burn a valid token.
        let password_hash = hash_password(&payload.password)?;

        let account = self
            .tokens
            .consume_reset(&payload.token, &password_hash)
            .await?
            .ok_or(AuthError::InvalidOrExpiredToken)?;

        info!(account_id = %account.id, "Password reset");

        Ok(MessageResponse {
            message: "Password has been reset successfully".to_string(),
        })
    }

    /// Re-issue a verification link for a pending account.
    ///
    /// Unlike registration, a send failure here does not clear the fresh
    /// secret: the account was already pending verification and there is
    /// nothing to roll back to.
    pub async fn resend_verification(
        &self,
        payload: ResendVerificationRequest,
    ) -> Result<MessageResponse> {
        if payload.email.is_empty() {
            return Err(AuthError::Validation("Email is required".to_string()));
        }

        let email = normalize_email(&payload.email);
        let account = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        if account.is_verified {
            return Err(AuthError::AlreadyVerified);
        }

        let token = self.tokens.issue_verification_link(account.id).await?;
        self.mailer.send_verification(&email, &token).await?;

        info!(account_id = %account.id, "Verification email resent");

        Ok(MessageResponse {
            message: "Verification email has been resent".to_string(),
        })
    }
}

/// Emails are the natural account key: compared trimmed and lowercased.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Mask an email address for logging.
fn mask_email(email: &str) -> String {
    match email.find('@') {
        Some(at) if at > 1 => format!("{}***{}", &email[..1], &email[at..]),
        Some(at) => format!("**{}", &email[at..]),
        None => "***".to_string(),
    }
}
