/// Authentication handlers
///
/// Thin transport layer: each handler deserializes its payload and delegates
/// to the orchestrator in `services::auth`.
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::error::AuthError;
use crate::models::account::{
    ForgotPasswordRequest, LoginRequest, RegisterRequest, ResendVerificationRequest,
    ResetPasswordRequest, VerifyCodeRequest,
};
use crate::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let response = state.auth.register(payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn verify_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, AuthError> {
    let response = state.auth.verify_email(&token).await?;
    Ok(Json(response))
}

pub async fn verify_code(
    State(state): State<AppState>,
    Json(payload): Json<VerifyCodeRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let response = state.auth.verify_code(payload).await?;
    Ok(Json(response))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let response = state.auth.login(payload).await?;
    Ok(Json(response))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let response = state.auth.forgot_password(payload).await?;
    Ok(Json(response))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let response = state.auth.reset_password(payload).await?;
    Ok(Json(response))
}

pub async fn resend_verification(
    State(state): State<AppState>,
    Json(payload): Json<ResendVerificationRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let response = state.auth.resend_verification(payload).await?;
    Ok(Json(response))
}
