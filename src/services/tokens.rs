/// Token lifecycle management
///
/// Issues, consumes, and clears the single-use secrets attached to an
/// account. Plaintext secrets are returned to the caller for delivery; only
/// their digests are persisted. Consumption is delegated to the store's
/// atomic find-and-clear operations, so a secret can never be used twice and
/// an expired secret is indistinguishable from one that never existed.
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{AccountStore, SecretKind};
use crate::error::Result;
use crate::models::Account;
use crate::security::secret;

pub const VERIFICATION_LINK_TTL_HOURS: i64 = 24;
pub const VERIFICATION_CODE_TTL_MINUTES: i64 = 10;
pub const RESET_TTL_HOURS: i64 = 1;

#[derive(Clone)]
pub struct TokenManager {
    store: Arc<dyn AccountStore>,
}

impl TokenManager {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// Issue a 24-hour verification link token, superseding any pending one.
    pub async fn issue_verification_link(&self, account_id: Uuid) -> Result<String> {
        let token = secret::generate_token();
        let expires_at = Utc::now() + Duration::hours(VERIFICATION_LINK_TTL_HOURS);
        self.store
            .set_secret(
                account_id,
                SecretKind::Verification,
                &secret::digest(&token),
                expires_at,
            )
            .await?;
        Ok(token)
    }

    /// Issue a 10-minute 6-digit verification code, superseding any pending
    /// verification secret.
    pub async fn issue_verification_code(&self, account_id: Uuid) -> Result<String> {
        let code = secret::generate_code();
        let expires_at = Utc::now() + Duration::minutes(VERIFICATION_CODE_TTL_MINUTES);
        self.store
            .set_secret(
                account_id,
                SecretKind::Verification,
                &secret::digest(&code),
                expires_at,
            )
            .await?;
        Ok(code)
    }

    /// Issue a 1-hour password reset token.
    pub async fn issue_reset(&self, account_id: Uuid) -> Result<String> {
        let token = secret::generate_token();
        let expires_at = Utc::now() + Duration::hours(RESET_TTL_HOURS);
        self.store
            .set_secret(
                account_id,
                SecretKind::Reset,
                &secret::digest(&token),
                expires_at,
            )
            .await?;
        Ok(token)
    }

    pub async fn consume_verification_link(&self, token: &str) -> Result<Option<Account>> {
        self.store
            .consume_verification(&secret::digest(token))
            .await
    }

    pub async fn consume_verification_code(
        &self,
        email: &str,
        code: &str,
    ) -> Result<Option<Account>> {
        self.store
            .consume_verification_code(email, &secret::digest(code))
            .await
    }

    pub async fn consume_reset(
        &self,
        token: &str,
        new_password_hash: &str,
    ) -> Result<Option<Account>> {
        self.store
            .consume_reset(&secret::digest(token), new_password_hash)
            .await
    }

    /// Explicit invalidation, used when a follow-up effect fails and the
    /// just-issued secret must not remain claimable.
    pub async fn clear(&self, account_id: Uuid, kind: SecretKind) -> Result<()> {
        self.store.clear_secret(account_id, kind).await
    }
}
