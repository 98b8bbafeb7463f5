/// Password hashing and verification using Argon2id
use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Argon2, PasswordHash, PasswordVerifier,
};

use crate::error::{AuthError, Result};

const MIN_PASSWORD_LENGTH: usize = 8;

/// Hash a password using Argon2id with a random salt.
///
/// Called exactly once per password change, at registration and reset time.
/// Update paths receive the finished hash so a stored digest is never
/// re-hashed.
pub fn hash_password(password: &str) -> Result<String> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    let salt = SaltString::generate(rand::thread_rng());
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AuthError::Internal("Failed to hash password".to_string()))?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<()> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AuthError::Internal("Invalid password hash format".to_string()))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
