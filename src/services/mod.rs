pub mod auth;
pub mod mailer;
pub mod tokens;

pub use auth::AuthService;
pub use mailer::{Mailer, SmtpMailer};
pub use tokens::TokenManager;
