//! Account endpoints.

use axum::{Extension, Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::{
    IdPath, ValidatedJson, require, validate_email, validate_password, validate_username,
};
use crate::api::{ApiError, AppState, UserDto};
use crate::domain::UserId;
use crate::services::{IdentityError, Registration};

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Conflict(msg) => Self::Conflict(msg),
            IdentityError::NotFound(msg) => Self::NotFound(msg),
            IdentityError::Forbidden(forbidden) => forbidden.into(),
            IdentityError::InvalidCredentials => Self::invalid_credentials(),
            IdentityError::Expired(msg) => Self::Gone(msg),
            IdentityError::Database(msg) => Self::DatabaseError(msg),
            IdentityError::Internal(msg) => Self::internal(msg),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: UserDto,
}

/// `POST /users`
///
/// # Errors
/// 422 on a malformed payload, 409 when the email or username is taken.
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let username = require(payload.username, "username")?;
    validate_username(&username)?;
    let email = require(payload.email, "email")?;
    validate_email(&email)?;
    let password = validate_password(
        payload.password,
        state.config().security.min_password_length,
    )?;

    let user = state
        .identity_service()
        .register(Registration {
            username,
            email,
            password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponse { user: user.into() }),
    ))
}

/// `PUT /users/{user_id}`
///
/// Replaces email and password of the caller's own account.
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    IdPath(user_id): IdPath<i32>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let email = require(payload.email, "email")?;
    validate_email(&email)?;
    let password = validate_password(
        payload.password,
        state.config().security.min_password_length,
    )?;

    let user = state
        .identity_service()
        .update_user(UserId::new(user_id), actor, &email, &password)
        .await?;

    Ok(Json(UserResponse { user: user.into() }))
}
