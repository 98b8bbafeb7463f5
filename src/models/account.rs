use chrono::{DateTime, Utc};
/// Account model and request/response payloads
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Fixed set of account roles. Unknown values are rejected at the
/// deserialization boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "account_role", rename_all = "PascalCase")]
pub enum Role {
    Buyer,
    Tenant,
    Owner,
    User,
    Admin,
    #[serde(rename = "Content Creator")]
    #[sqlx(rename = "Content Creator")]
    ContentCreator,
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub phone_number: Option<String>,
    pub address: Option<Json<Address>>,
    pub is_verified: bool,
    pub verification_secret: Option<String>,
    pub verification_expires_at: Option<DateTime<Utc>>,
    pub reset_secret: Option<String>,
    pub reset_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new account row. The password hash is computed by the caller;
/// the store never sees a plaintext password.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub phone_number: Option<String>,
    pub address: Option<Address>,
}

/// How a newly registered account proves control of its email address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationMethod {
    /// 24-hour single-use link token delivered by email.
    Link,
    /// 10-minute 6-digit code delivered by email.
    Code,
}

impl Default for VerificationMethod {
    fn default() -> Self {
        VerificationMethod::Link
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub verification: Option<VerificationMethod>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ResendVerificationRequest {
    #[serde(default)]
    pub email: String,
}

/// Client-facing view of an account. Never exposes the password hash or any
/// pending secrets.
#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub is_verified: bool,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            name: account.name.clone(),
            role: account.role,
            is_verified: account.is_verified,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub account: AccountSummary,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub account: AccountSummary,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
