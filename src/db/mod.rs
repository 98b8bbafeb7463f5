/// Account persistence
///
/// The store is behind a trait so the orchestrator can run against the
/// Postgres implementation in production and an in-memory fake in tests.
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Account, NewAccount};

pub use postgres::PgAccountStore;

/// Which single-use secret a store operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKind {
    Verification,
    Reset,
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a new account. Email uniqueness is enforced by the store itself
    /// (not by a prior read), so concurrent duplicate submissions cannot both
    /// succeed. Returns `DuplicateEmail` on conflict.
    async fn create_unique(&self, account: NewAccount) -> Result<Account>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// Attach a secret digest and expiry of the given kind, replacing any
    /// previous one.
    async fn set_secret(
        &self,
        id: Uuid,
        kind: SecretKind,
        secret_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Drop a pending secret and its expiry. Used on rollback.
    async fn clear_secret(&self, id: Uuid, kind: SecretKind) -> Result<()>;

    /// Atomically consume an unexpired verification secret: marks the account
    /// verified and clears the secret pair in one operation. Expired or
    /// unknown secrets return `None` indistinguishably.
    async fn consume_verification(&self, secret_hash: &str) -> Result<Option<Account>>;

    /// Code-flow variant of `consume_verification`: a 6-digit code is not
    /// globally unique, so the match is jointly constrained on the email.
    async fn consume_verification_code(
        &self,
        email: &str,
        secret_hash: &str,
    ) -> Result<Option<Account>>;

    /// Atomically consume an unexpired reset secret, replacing the password
    /// hash and clearing the secret pair in one operation.
    async fn consume_reset(
        &self,
        secret_hash: &str,
        new_password_hash: &str,
    ) -> Result<Option<Account>>;

    /// Remove an account row. Only used as a compensating action when the
    /// registration email cannot be sent.
    async fn delete(&self, id: Uuid) -> Result<()>;
}
