use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    #[error("No account found with this email")]
    AccountNotFound,

    #[error("Email is already verified")]
    AlreadyVerified,

    #[error("Failed to send email: {0}")]
    EmailDispatch(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AuthError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AuthError::DuplicateEmail => {
                (StatusCode::BAD_REQUEST, "Email already registered".to_string())
            }
            AuthError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
            }
            AuthError::InvalidOrExpiredToken => {
                (StatusCode::BAD_REQUEST, "Invalid or expired token".to_string())
            }
            AuthError::AccountNotFound => (
                StatusCode::NOT_FOUND,
                "No account found with this email".to_string(),
            ),
            AuthError::AlreadyVerified => {
                (StatusCode::BAD_REQUEST, "Email is already verified".to_string())
            }
            AuthError::EmailDispatch(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to send email. Please try again later.".to_string(),
            ),
            AuthError::Database(_) | AuthError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong. Please try again later.".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::Database(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(_err: jsonwebtoken::errors::Error) -> Self {
        AuthError::InvalidOrExpiredToken
    }
}
