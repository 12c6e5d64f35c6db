use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::{ApiError, AppState};
use crate::domain::UserId;

/// The authenticated user, inserted by [`auth_middleware`].
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub UserId);

/// The raw bearer token of the current request, needed to log out.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

/// Resolves `Authorization: Bearer <token>` to a user or answers 401.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(request.headers()).ok_or_else(ApiError::unauthorized)?;

    let user_id = state
        .identity_service()
        .resolve_token(&token)
        .await?
        .ok_or_else(ApiError::unauthorized)?;

    tracing::Span::current().record("user_id", tracing::field::display(user_id));

    request.extensions_mut().insert(CurrentUser(user_id));
    request.extensions_mut().insert(BearerToken(token));

    Ok(next.run(request).await)
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("Authorization")?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}
