//! `SeaORM` implementation of the `IdentityService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::SecurityConfig;
use crate::db::repositories::user::hash_password_blocking;
use crate::db::{Store, User, is_unique_violation, parse_timestamp};
use crate::domain::UserId;
use crate::domain::policy::{Action, Authorizer, authorize};
use crate::services::identity_service::{
    IdentityError, IdentityService, PruneReport, Registration, Session,
};
use crate::services::mailer::{MailQueue, reset_link};

pub struct SeaOrmIdentityService {
    store: Store,
    security: SecurityConfig,
    mail: Arc<MailQueue>,
    authorize: Authorizer,
}

impl SeaOrmIdentityService {
    #[must_use]
    pub fn new(store: Store, security: SecurityConfig, mail: Arc<MailQueue>) -> Self {
        Self {
            store,
            security,
            mail,
            authorize,
        }
    }

    #[must_use]
    pub fn with_authorizer(mut self, authorizer: Authorizer) -> Self {
        self.authorize = authorizer;
        self
    }
}

#[async_trait]
impl IdentityService for SeaOrmIdentityService {
    async fn register(&self, registration: Registration) -> Result<User, IdentityError> {
        let users = self.store.users();

        if users.email_taken(&registration.email).await? {
            return Err(IdentityError::Conflict("email already in use".to_string()));
        }

        if users.username_taken(&registration.username).await? {
            return Err(IdentityError::Conflict("username already in use".to_string()));
        }

        let user = match users
            .create(
                &registration.username,
                &registration.email,
                &registration.password,
                &self.security,
            )
            .await
        {
            Ok(user) => user,
            Err(e) if is_unique_violation(&e) => {
                return Err(IdentityError::Conflict(
                    "email or username already in use".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        info!(user_id = %user.id, username = %user.username, "User registered");
        self.mail.send_welcome(&user);

        Ok(user)
    }

    async fn update_user(
        &self,
        id: UserId,
        actor: UserId,
        email: &str,
        password: &str,
    ) -> Result<User, IdentityError> {
        let users = self.store.users();

        let user = users
            .get_by_id(id)
            .await?
            .ok_or_else(|| IdentityError::NotFound("user not found".to_string()))?;

        (self.authorize)(actor, Action::UpdateUser, user.id)?;

        if user.email != email
            && let Some(other) = users.get_by_email(email).await?
            && other.id != id
        {
            return Err(IdentityError::Conflict("email already in use".to_string()));
        }

        let updated = match users
            .update_credentials(id, email, password, &self.security)
            .await
        {
            Ok(updated) => updated,
            Err(e) if is_unique_violation(&e) => {
                return Err(IdentityError::Conflict("email already in use".to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let updated =
            updated.ok_or_else(|| IdentityError::NotFound("user not found".to_string()))?;
        info!(user_id = %updated.id, "User credentials updated");

        Ok(updated)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let Some(user) = self
            .store
            .users()
            .verify_credentials(email, password)
            .await?
        else {
            metrics::counter!("mesa_logins_total", "outcome" => "failure").increment(1);
            return Err(IdentityError::InvalidCredentials);
        };

        let token = self
            .store
            .api_tokens()
            .issue(user.id, self.security.api_token_ttl()?)
            .await?;

        metrics::counter!("mesa_logins_total", "outcome" => "success").increment(1);
        info!(user_id = %user.id, "User logged in");

        Ok(Session { user, token })
    }

    async fn logout(&self, token: &str) -> Result<(), IdentityError> {
        if !self.store.api_tokens().revoke(token).await? {
            debug!("Logout with a token that was already gone");
        }
        Ok(())
    }

    async fn resolve_token(&self, token: &str) -> Result<Option<UserId>, IdentityError> {
        let tokens = self.store.api_tokens();

        let Some(record) = tokens.find(token).await? else {
            return Ok(None);
        };

        if parse_timestamp(&record.expires_at)? <= Utc::now() {
            debug!(user_id = %record.user_id, "Deleting expired API token");
            tokens.delete(record.id).await?;
            return Ok(None);
        }

        Ok(Some(record.user_id))
    }

    async fn request_password_reset(
        &self,
        email: &str,
        reset_url: &str,
    ) -> Result<(), IdentityError> {
        let Some(user) = self.store.users().get_by_email(email).await? else {
            debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let token = self.store.password_resets().create(user.id).await?;
        let link = reset_link(reset_url, &token)?;

        info!(user_id = %user.id, "Password reset token issued");
        self.mail.send_password_reset(&user, &link);

        Ok(())
    }

    async fn reset_password(&self, token: &str, password: &str) -> Result<(), IdentityError> {
        let resets = self.store.password_resets();

        let record = resets
            .find(token)
            .await?
            .ok_or_else(|| IdentityError::NotFound("token not found".to_string()))?;

        let created_at = parse_timestamp(&record.created_at)?;
        let ttl = self.security.password_reset_ttl()?;
        if Utc::now() - created_at > ttl {
            resets.delete(record.id).await?;
            warn!(user_id = %record.user_id, "Expired password reset token used");
            return Err(IdentityError::Expired("token expired".to_string()));
        }

        let password_hash = hash_password_blocking(password, &self.security).await?;

        if !resets.consume(&record, password_hash).await? {
            return Err(IdentityError::NotFound("token not found".to_string()));
        }

        info!(user_id = %record.user_id, "Password reset completed");
        Ok(())
    }

    async fn prune_expired_tokens(&self) -> Result<PruneReport, IdentityError> {
        let api_tokens = self.store.api_tokens().prune_expired().await?;
        let reset_tokens = self
            .store
            .password_resets()
            .prune_expired(self.security.password_reset_ttl()?)
            .await?;

        info!(api_tokens, reset_tokens, "Pruned expired tokens");

        Ok(PruneReport {
            api_tokens,
            reset_tokens,
        })
    }
}
