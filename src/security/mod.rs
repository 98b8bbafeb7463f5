/// Security primitives: password hashing, secret generation, session tokens
pub mod jwt;
pub mod password;
pub mod secret;

pub use jwt::{SessionClaims, SessionIssuer};
pub use password::{hash_password, verify_password};
