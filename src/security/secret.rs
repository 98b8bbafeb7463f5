/// Single-use secret generation
///
/// Both forms are drawn from the thread-local CSPRNG; predictable values here
/// are a direct account-takeover vector.
use rand::Rng;
use sha2::{Digest, Sha256};

const TOKEN_BYTES: usize = 32;

/// Generate an opaque token for verification links and password resets.
/// 32 random bytes, hex-encoded.
pub fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..TOKEN_BYTES).map(|_| rng.gen()).collect();
    hex::encode(bytes)
}

/// Generate a 6-digit verification code, uniform over [100000, 999999].
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    rng.gen_range(100_000..=999_999).to_string()
}

/// SHA-256 digest of a secret. Only digests are persisted; the plaintext
/// value leaves the process exactly once, inside the email.
pub fn digest(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}
