//! Login and logout.

use axum::{Extension, Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::BearerToken;
use super::validation::ValidatedJson;
use crate::api::{ApiError, AppState, Empty, TokenDto, UserDto};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserDto,
    pub token: TokenDto,
}

/// `POST /sessions`
///
/// Missing fields are reported the same way as wrong credentials.
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), ApiError> {
    let (Some(email), Some(password)) = (payload.email, payload.password) else {
        return Err(ApiError::invalid_credentials());
    };

    let session = state
        .identity_service()
        .authenticate(email.trim(), &password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(LoginResponse {
            user: session.user.into(),
            token: session.token.into(),
        }),
    ))
}

/// `DELETE /sessions`
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(BearerToken(token)): Extension<BearerToken>,
) -> Result<Json<Empty>, ApiError> {
    state.identity_service().logout(&token).await?;
    Ok(Json(Empty {}))
}
