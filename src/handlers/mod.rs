pub mod auth;

pub use auth::{
    forgot_password, login, register, resend_verification, reset_password, verify_code,
    verify_email,
};
