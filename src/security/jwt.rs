/// Session token issue and verification
///
/// Bearer sessions are HS256 JWTs signed with the process-wide secret from
/// configuration, carrying the account id as the subject. Fixed 24-hour
/// lifetime, no refresh mechanism.
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AuthError, Result};

const SESSION_EXPIRY_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Account id as a UUID string.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies session tokens. Keys are derived once at startup and
/// read-only thereafter.
#[derive(Clone)]
pub struct SessionIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SessionIssuer {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issue(&self, account_id: Uuid) -> Result<String> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: account_id.to_string(),
            iat: now.timestamp(),
            exp: (now + chrono::Duration::hours(SESSION_EXPIRY_HOURS)).timestamp(),
        };

        // A signing failure is a server fault, not a bad client token; do
        // not let it fall into the decode-path From impl.
        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Failed to sign session token: {}", e)))?;
        Ok(token)
    }

    /// Verify a session token and return its claims. Used by protected-route
    /// middleware; the write paths in this crate only issue.
    pub fn verify(&self, token: &str) -> Result<SessionClaims> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &Validation::default())?;
        Ok(data.claims)
    }
}
