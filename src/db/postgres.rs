use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{AccountStore, SecretKind};
use crate::error::{AuthError, Result};
use crate::models::{Account, NewAccount};

/// Postgres unique-violation SQLSTATE.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn create_unique(&self, account: NewAccount) -> Result<Account> {
        let created = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (id, email, password_hash, name, role, phone_number, address, is_verified, created_at)
            VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, $6, false, CURRENT_TIMESTAMP)
            RETURNING *
            "#,
        )
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.name)
        .bind(account.role)
        .bind(&account.phone_number)
        .bind(account.address.map(Json))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                    return AuthError::DuplicateEmail;
                }
            }
            AuthError::Database(e.to_string())
        })?;

        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT * FROM accounts WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn set_secret(
        &self,
        id: Uuid,
        kind: SecretKind,
        secret_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let query = match kind {
            SecretKind::Verification => {
                r#"
                UPDATE accounts
                SET verification_secret = $1, verification_expires_at = $2
                WHERE id = $3
                "#
            }
            SecretKind::Reset => {
                r#"
                UPDATE accounts
                SET reset_secret = $1, reset_expires_at = $2
                WHERE id = $3
                "#
            }
        };

        sqlx::query(query)
            .bind(secret_hash)
            .bind(expires_at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn clear_secret(&self, id: Uuid, kind: SecretKind) -> Result<()> {
        let query = match kind {
            SecretKind::Verification => {
                r#"
                UPDATE accounts
                SET verification_secret = NULL, verification_expires_at = NULL
                WHERE id = $1
                "#
            }
            SecretKind::Reset => {
                r#"
                UPDATE accounts
                SET reset_secret = NULL, reset_expires_at = NULL
                WHERE id = $1
                "#
            }
        };

        sqlx::query(query).bind(id).execute(&self.pool).await?;

        Ok(())
    }

    async fn consume_verification(&self, secret_hash: &str) -> Result<Option<Account>> {
        // Single-statement find-and-clear: two concurrent consumers cannot
        // both match the same secret.
        let account = sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts
            SET is_verified = true, verification_secret = NULL, verification_expires_at = NULL
            WHERE verification_secret = $1 AND verification_expires_at > CURRENT_TIMESTAMP
            RETURNING *
            "#,
        )
        .bind(secret_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn consume_verification_code(
        &self,
        email: &str,
        secret_hash: &str,
    ) -> Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts
            SET is_verified = true, verification_secret = NULL, verification_expires_at = NULL
            WHERE email = $1 AND verification_secret = $2
              AND verification_expires_at > CURRENT_TIMESTAMP
            RETURNING *
            "#,
        )
        .bind(email)
        .bind(secret_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn consume_reset(
        &self,
        secret_hash: &str,
        new_password_hash: &str,
    ) -> Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts
            SET password_hash = $2, reset_secret = NULL, reset_expires_at = NULL
            WHERE reset_secret = $1 AND reset_expires_at > CURRENT_TIMESTAMP
            RETURNING *
            "#,
        )
        .bind(secret_hash)
        .bind(new_password_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            DELETE FROM accounts WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
