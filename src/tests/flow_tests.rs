/// End-to-end flow tests for the auth orchestrator
use crate::error::AuthError;
use crate::models::account::{
    ForgotPasswordRequest, LoginRequest, RegisterRequest, ResendVerificationRequest,
    ResetPasswordRequest, VerifyCodeRequest,
};
use crate::models::{Role, VerificationMethod};
use crate::tests::fixtures::*;

fn login_request(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn test_register_verify_login_flow() {
    let h = harness();

    let response = h.auth.register(register_request("ann@example.com")).await.unwrap();
    assert_eq!(response.account.email, "ann@example.com");
    assert_eq!(response.account.role, Role::User);
    assert!(!response.account.is_verified);

    let token = h.mailer.last_secret();
    h.auth.verify_email(&token).await.unwrap();

    let login = h.auth.login(login_request("ann@example.com", "Secret123")).await.unwrap();
    assert!(login.account.is_verified);

    let claims = h.sessions.verify(&login.token).unwrap();
    assert_eq!(claims.sub, login.account.id.to_string());
}

#[tokio::test]
async fn test_register_normalizes_email() {
    let h = harness();

    h.auth.register(register_request("  Ann@Example.COM ")).await.unwrap();

    assert!(h.store.get("ann@example.com").is_some());

    // Lookup through a differently-cased spelling still resolves.
    let result = h.auth.login(login_request("ANN@example.com", "Secret123")).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    let h = harness();

    h.auth.register(register_request("ann@example.com")).await.unwrap();
    let second = h.auth.register(register_request("Ann@Example.com")).await;

    assert!(matches!(second, Err(AuthError::DuplicateEmail)));
}

#[tokio::test]
async fn test_concurrent_duplicate_registration_single_winner() {
    let h = harness();

    // Two simultaneous submissions of the same email: uniqueness is enforced
    // by the store itself, so exactly one creation succeeds.
    let (first, second) = tokio::join!(
        h.auth.register(register_request("ann@example.com")),
        h.auth.register(register_request("ann@example.com")),
    );

    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);

    let conflict = if first.is_ok() { second } else { first };
    assert!(matches!(conflict, Err(AuthError::DuplicateEmail)));
}

#[tokio::test]
async fn test_concurrent_consume_single_winner() {
    let h = harness();

    h.auth.register(register_request("ann@example.com")).await.unwrap();
    let token = h.mailer.last_secret();

    // Consume is an atomic find-and-clear: two racing requests on the same
    // token cannot both succeed.
    let (first, second) = tokio::join!(h.auth.verify_email(&token), h.auth.verify_email(&token));

    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);

    let loser = if first.is_ok() { second } else { first };
    assert!(matches!(loser, Err(AuthError::InvalidOrExpiredToken)));
}

#[tokio::test]
async fn test_verification_token_is_single_use() {
    let h = harness();

    h.auth.register(register_request("ann@example.com")).await.unwrap();
    let token = h.mailer.last_secret();

    h.auth.verify_email(&token).await.unwrap();
    let second = h.auth.verify_email(&token).await;

    assert!(matches!(second, Err(AuthError::InvalidOrExpiredToken)));
}

#[tokio::test]
async fn test_expired_token_indistinguishable_from_unknown() {
    let h = harness();

    h.auth.register(register_request("ann@example.com")).await.unwrap();
    let token = h.mailer.last_secret();
    h.store.expire_secrets("ann@example.com");

    let expired = h.auth.verify_email(&token).await.unwrap_err();
    let unknown = h.auth.verify_email("deadbeef").await.unwrap_err();

    assert_eq!(expired.to_string(), unknown.to_string());
    assert!(matches!(expired, AuthError::InvalidOrExpiredToken));
}

#[tokio::test]
async fn test_login_error_is_generic() {
    let h = harness();

    h.auth.register(register_request("ann@example.com")).await.unwrap();

    let wrong_password = h
        .auth
        .login(login_request("ann@example.com", "WrongPass1"))
        .await
        .unwrap_err();
    let unknown_email = h
        .auth
        .login(login_request("nobody@example.com", "Secret123"))
        .await
        .unwrap_err();

    // Neither error reveals which field was wrong.
    assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    assert!(matches!(wrong_password, AuthError::InvalidCredentials));
    assert!(matches!(unknown_email, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn test_login_requires_both_fields() {
    let h = harness();

    let result = h.auth.login(login_request("ann@example.com", "")).await;
    assert!(matches!(result, Err(AuthError::Validation(_))));

    let result = h.auth.login(login_request("", "Secret123")).await;
    assert!(matches!(result, Err(AuthError::Validation(_))));
}

#[tokio::test]
async fn test_forgot_reset_login_flow() {
    let h = harness();

    h.auth.register(register_request("ann@example.com")).await.unwrap();

    h.auth
        .forgot_password(ForgotPasswordRequest {
            email: "ann@example.com".to_string(),
        })
        .await
        .unwrap();

    let token = h.mailer.last_secret();
    h.auth
        .reset_password(ResetPasswordRequest {
            token,
            password: "NewPass1".to_string(),
        })
        .await
        .unwrap();

    let old = h.auth.login(login_request("ann@example.com", "Secret123")).await;
    assert!(matches!(old, Err(AuthError::InvalidCredentials)));

    let new = h.auth.login(login_request("ann@example.com", "NewPass1")).await;
    assert!(new.is_ok());
}

#[tokio::test]
async fn test_reset_token_is_single_use() {
    let h = harness();

    h.auth.register(register_request("ann@example.com")).await.unwrap();
    h.auth
        .forgot_password(ForgotPasswordRequest {
            email: "ann@example.com".to_string(),
        })
        .await
        .unwrap();

    let token = h.mailer.last_secret();
    h.auth
        .reset_password(ResetPasswordRequest {
            token: token.clone(),
            password: "NewPass1".to_string(),
        })
        .await
        .unwrap();

    let again = h
        .auth
        .reset_password(ResetPasswordRequest {
            token,
            password: "OtherPass1".to_string(),
        })
        .await;
    assert!(matches!(again, Err(AuthError::InvalidOrExpiredToken)));
}

#[tokio::test]
async fn test_expired_reset_token_rejected() {
    let h = harness();

    h.auth.register(register_request("ann@example.com")).await.unwrap();
    h.auth
        .forgot_password(ForgotPasswordRequest {
            email: "ann@example.com".to_string(),
        })
        .await
        .unwrap();

    let token = h.mailer.last_secret();
    h.store.expire_secrets("ann@example.com");

    let result = h
        .auth
        .reset_password(ResetPasswordRequest {
            token,
            password: "NewPass1".to_string(),
        })
        .await;
    assert!(matches!(result, Err(AuthError::InvalidOrExpiredToken)));
}

#[tokio::test]
async fn test_forgot_password_reveals_missing_account() {
    let h = harness();

    let result = h
        .auth
        .forgot_password(ForgotPasswordRequest {
            email: "nobody@example.com".to_string(),
        })
        .await;

    assert!(matches!(result, Err(AuthError::AccountNotFound)));
}

#[tokio::test]
async fn test_register_rolls_back_when_email_fails() {
    let h = harness();
    h.mailer.set_failing(true);

    let result = h.auth.register(register_request("ann@example.com")).await;
    assert!(matches!(result, Err(AuthError::EmailDispatch(_))));

    // No account row remains retrievable; the email can be registered again.
    assert!(h.store.get("ann@example.com").is_none());

    h.mailer.set_failing(false);
    assert!(h.auth.register(register_request("ann@example.com")).await.is_ok());
}

#[tokio::test]
async fn test_forgot_password_clears_secret_when_email_fails() {
    let h = harness();

    h.auth.register(register_request("ann@example.com")).await.unwrap();
    h.mailer.set_failing(true);

    let result = h
        .auth
        .forgot_password(ForgotPasswordRequest {
            email: "ann@example.com".to_string(),
        })
        .await;
    assert!(matches!(result, Err(AuthError::EmailDispatch(_))));

    // The account survives but holds no dangling reset secret.
    let account = h.store.get("ann@example.com").unwrap();
    assert!(account.reset_secret.is_none());
    assert!(account.reset_expires_at.is_none());
}

#[tokio::test]
async fn test_resend_verification_supersedes_previous_token() {
    let h = harness();

    h.auth.register(register_request("ann@example.com")).await.unwrap();
    let old_token = h.mailer.last_secret();

    h.auth
        .resend_verification(ResendVerificationRequest {
            email: "ann@example.com".to_string(),
        })
        .await
        .unwrap();
    let new_token = h.mailer.last_secret();

    assert_ne!(old_token, new_token);
    assert!(matches!(
        h.auth.verify_email(&old_token).await,
        Err(AuthError::InvalidOrExpiredToken)
    ));
    assert!(h.auth.verify_email(&new_token).await.is_ok());
}

#[tokio::test]
async fn test_resend_verification_terminal_states() {
    let h = harness();

    let missing = h
        .auth
        .resend_verification(ResendVerificationRequest {
            email: "nobody@example.com".to_string(),
        })
        .await;
    assert!(matches!(missing, Err(AuthError::AccountNotFound)));

    h.auth.register(register_request("ann@example.com")).await.unwrap();
    let token = h.mailer.last_secret();
    h.auth.verify_email(&token).await.unwrap();

    let verified = h
        .auth
        .resend_verification(ResendVerificationRequest {
            email: "ann@example.com".to_string(),
        })
        .await;
    assert!(matches!(verified, Err(AuthError::AlreadyVerified)));
}

#[tokio::test]
async fn test_resend_failure_keeps_pending_secret() {
    let h = harness();

    h.auth.register(register_request("ann@example.com")).await.unwrap();
    h.mailer.set_failing(true);

    let result = h
        .auth
        .resend_verification(ResendVerificationRequest {
            email: "ann@example.com".to_string(),
        })
        .await;
    assert!(matches!(result, Err(AuthError::EmailDispatch(_))));

    // Unlike registration, the freshly issued secret stays attached.
    let account = h.store.get("ann@example.com").unwrap();
    assert!(account.verification_secret.is_some());
    assert!(account.verification_expires_at.is_some());
}

#[tokio::test]
async fn test_code_verification_flow() {
    let h = harness();

    let mut request = register_request("ann@example.com");
    request.verification = Some(VerificationMethod::Code);
    h.auth.register(request).await.unwrap();

    let sent = h.mailer.sent.lock().unwrap().last().unwrap().clone();
    assert_eq!(sent.kind, SentKind::VerificationCode);
    assert_eq!(sent.secret.len(), 6);
    let code = sent.secret;

    // A code alone is not globally unique, so the wrong email must not match.
    let wrong_email = h
        .auth
        .verify_code(VerifyCodeRequest {
            email: "other@example.com".to_string(),
            code: code.clone(),
        })
        .await;
    assert!(matches!(wrong_email, Err(AuthError::InvalidOrExpiredToken)));

    h.auth
        .verify_code(VerifyCodeRequest {
            email: "ann@example.com".to_string(),
            code,
        })
        .await
        .unwrap();

    let account = h.store.get("ann@example.com").unwrap();
    assert!(account.is_verified);
}

#[tokio::test]
async fn test_verify_code_requires_both_fields() {
    let h = harness();

    let result = h
        .auth
        .verify_code(VerifyCodeRequest {
            email: String::new(),
            code: "123456".to_string(),
        })
        .await;
    assert!(matches!(result, Err(AuthError::Validation(_))));
}

#[tokio::test]
async fn test_register_rejects_invalid_payload() {
    let h = harness();

    let bad_email = register_request("not-an-email");
    assert!(matches!(
        h.auth.register(bad_email).await,
        Err(AuthError::Validation(_))
    ));

    let mut short_password = register_request("ann@example.com");
    short_password.password = "short".to_string();
    assert!(matches!(
        h.auth.register(short_password).await,
        Err(AuthError::Validation(_))
    ));

    // A whitespace-only name trims to empty and must not be stored.
    let mut blank_name = register_request("ann@example.com");
    blank_name.name = "   ".to_string();
    assert!(matches!(
        h.auth.register(blank_name).await,
        Err(AuthError::Validation(_))
    ));
    assert!(h.store.get("ann@example.com").is_none());
}

#[tokio::test]
async fn test_register_trims_name() {
    let h = harness();

    let mut request = register_request("ann@example.com");
    request.name = "  Ann  ".to_string();
    let response = h.auth.register(request).await.unwrap();

    assert_eq!(response.account.name, "Ann");
}

#[tokio::test]
async fn test_rollback_failure_still_reports_email_dispatch() {
    let h = harness();
    h.mailer.set_failing(true);
    h.store.set_failing_deletes(true);

    // Even when the compensating delete fails, the client-facing error stays
    // the send failure rather than the rollback's own error.
    let result = h.auth.register(register_request("ann@example.com")).await;
    assert!(matches!(result, Err(AuthError::EmailDispatch(_))));
}

#[tokio::test]
async fn test_reset_rejects_short_password_without_burning_token() {
    let h = harness();

    h.auth.register(register_request("ann@example.com")).await.unwrap();
    h.auth
        .forgot_password(ForgotPasswordRequest {
            email: "ann@example.com".to_string(),
        })
        .await
        .unwrap();
    let token = h.mailer.last_secret();

    let result = h
        .auth
        .reset_password(ResetPasswordRequest {
            token: token.clone(),
            password: "short".to_string(),
        })
        .await;
    assert!(matches!(result, Err(AuthError::Validation(_))));

    // The token is still valid for a well-formed retry.
    assert!(h
        .auth
        .reset_password(ResetPasswordRequest {
            token,
            password: "NewPass1".to_string(),
        })
        .await
        .is_ok());
}

#[test]
fn test_role_parsing() {
    let request: RegisterRequest = serde_json::from_str(
        r#"{"email":"ann@example.com","password":"Secret123","name":"Ann","role":"Content Creator"}"#,
    )
    .unwrap();
    assert_eq!(request.role, Some(Role::ContentCreator));

    // Unknown role labels are rejected at the deserialization boundary.
    let unknown = serde_json::from_str::<RegisterRequest>(
        r#"{"email":"ann@example.com","password":"Secret123","name":"Ann","role":"Wizard"}"#,
    );
    assert!(unknown.is_err());
}

#[tokio::test]
async fn test_registration_records_verification_sender() {
    let h = harness();

    h.auth.register(register_request("ann@example.com")).await.unwrap();

    assert_eq!(h.mailer.sent_count(), 1);
    let sent = h.mailer.sent.lock().unwrap().last().unwrap().clone();
    assert_eq!(sent.to, "ann@example.com");
    assert_eq!(sent.kind, SentKind::VerificationLink);
    assert_eq!(sent.secret.len(), 64);
}
