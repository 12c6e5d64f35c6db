//! Accounts, bearer tokens and password recovery.

use thiserror::Error;

use crate::db::{IssuedToken, User};
use crate::domain::UserId;
use crate::domain::policy::Forbidden;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Forbidden(#[from] Forbidden),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Expired(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for IdentityError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for IdentityError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// A successful login.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: IssuedToken,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub api_tokens: u64,
    pub reset_tokens: u64,
}

#[async_trait::async_trait]
pub trait IdentityService: Send + Sync {
    /// Creates an account and queues a welcome mail.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Conflict`] if the email or username is taken.
    async fn register(&self, registration: Registration) -> Result<User, IdentityError>;

    /// Replaces email and password of `id`. Only the account owner may do this.
    async fn update_user(
        &self,
        id: UserId,
        actor: UserId,
        email: &str,
        password: &str,
    ) -> Result<User, IdentityError>;

    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidCredentials`] for an unknown email and a wrong password alike.
    async fn authenticate(&self, email: &str, password: &str) -> Result<Session, IdentityError>;

    async fn logout(&self, token: &str) -> Result<(), IdentityError>;

    /// Resolves a bearer token. Expired tokens are deleted and yield `None`.
    async fn resolve_token(&self, token: &str) -> Result<Option<UserId>, IdentityError>;

    /// Always succeeds for a well-formed request, whether or not the email is known.
    async fn request_password_reset(&self, email: &str, reset_url: &str)
    -> Result<(), IdentityError>;

    /// # Errors
    ///
    /// [`IdentityError::NotFound`] for an unknown or consumed token,
    /// [`IdentityError::Expired`] once the token is older than the TTL.
    async fn reset_password(&self, token: &str, password: &str) -> Result<(), IdentityError>;

    async fn prune_expired_tokens(&self) -> Result<PruneReport, IdentityError>;
}
