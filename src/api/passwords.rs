//! Password recovery. Both endpoints are public.

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{ValidatedJson, require, validate_email, validate_password, validate_url};
use crate::api::{ApiError, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
    /// Page the mailed link points at; the token is appended as `?token=`.
    #[serde(
        alias = "reset_url",
        alias = "resetPasswordUrl",
        alias = "redirectUrl",
        alias = "redirect_url"
    )]
    pub reset_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: Option<String>,
    pub password: Option<String>,
}

/// `POST /forgot-password`
///
/// Answers 204 whether or not the email belongs to an account.
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<ForgotPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    let email = require(payload.email, "email")?;
    validate_email(&email)?;
    let reset_url = require(payload.reset_url, "resetUrl")?;
    validate_url(&reset_url, "resetUrl")?;

    state
        .identity_service()
        .request_password_reset(&email, &reset_url)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// `POST /reset-password`
///
/// # Errors
/// 404 for an unknown or used token, 410 for an expired one.
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<ResetPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    let token = require(payload.token, "token")?;
    let password = validate_password(
        payload.password,
        state.config().security.min_password_length,
    )?;

    state
        .identity_service()
        .reset_password(&token, &password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
