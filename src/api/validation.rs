use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
};
use regex::Regex;
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use std::{fmt::Display, str::FromStr, sync::LazyLock};

use super::ApiError;

static EMAIL_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$"));

/// JSON body whose syntax and type errors are reported as 422.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Query string whose parse errors are reported as 422.
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Path parameters. An id that does not parse cannot name an existing row, so it is a 404.
pub struct IdPath<T>(pub T);

impl<T, S> FromRequestParts<S> for IdPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::not_found("resource not found"))?;
        Ok(Self(value))
    }
}

/// Required, non-blank string field. Returns the trimmed value.
pub fn require(value: Option<String>, field: &str) -> Result<String, ApiError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::validation(format!("{field} is required"))),
    }
}

/// Optional field that, when present, must not be blank.
pub fn optional(value: Option<String>, field: &str) -> Result<Option<String>, ApiError> {
    value.map(|v| require(Some(v), field)).transpose()
}

pub fn validate_email(email: &str) -> Result<(), ApiError> {
    let valid = EMAIL_RE
        .as_ref()
        .map_err(|e| ApiError::internal(format!("email pattern: {e}")))?
        .is_match(email);
    if !valid {
        return Err(ApiError::validation("email must be a valid email address"));
    }
    if email.len() > 255 {
        return Err(ApiError::validation("email must be 255 characters or less"));
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.chars().count() > 64 {
        return Err(ApiError::validation(
            "username must be 64 characters or less",
        ));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(ApiError::validation("username cannot contain spaces"));
    }
    Ok(())
}

/// Passwords are not trimmed; only their length is checked.
pub fn validate_password(password: Option<String>, min_length: usize) -> Result<String, ApiError> {
    let Some(password) = password.filter(|p| !p.is_empty()) else {
        return Err(ApiError::validation("password is required"));
    };
    if password.chars().count() < min_length {
        return Err(ApiError::validation(format!(
            "password must be at least {min_length} characters"
        )));
    }
    Ok(password)
}

pub fn validate_url(url: &str, field: &str) -> Result<(), ApiError> {
    match url::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(ApiError::validation(format!("{field} must be an http(s) URL"))),
    }
}

pub fn validate_positive_id(id: Option<i64>, field: &str) -> Result<i32, ApiError> {
    id.filter(|v| *v > 0)
        .and_then(|v| i32::try_from(v).ok())
        .ok_or_else(|| ApiError::validation(format!("{field} must be a positive integer")))
}

/// Query parameter where `?key=` means the same as leaving `key` out.
/// Use with `#[serde(default, deserialize_with = "blank_as_none")]`.
pub fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}
