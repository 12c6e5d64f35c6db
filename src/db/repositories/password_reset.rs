use anyhow::{Context, Result};
use chrono::{TimeDelta, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use super::api_token::{digest_token, generate_token};
use crate::db::{format_timestamp, now_timestamp};
use crate::domain::UserId;
use crate::entities::{password_reset_tokens, users};

#[derive(Debug, Clone)]
pub struct PasswordResetToken {
    pub id: i32,
    pub user_id: UserId,
    pub created_at: String,
}

impl From<password_reset_tokens::Model> for PasswordResetToken {
    fn from(model: password_reset_tokens::Model) -> Self {
        Self {
            id: model.id,
            user_id: UserId::new(model.user_id),
            created_at: model.created_at,
        }
    }
}

pub struct PasswordResetRepository {
    conn: DatabaseConnection,
}

impl PasswordResetRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Store a new reset token for the user and return the raw value.
    pub async fn create(&self, user_id: UserId) -> Result<String> {
        let token = generate_token();

        password_reset_tokens::ActiveModel {
            user_id: Set(user_id.value()),
            token_hash: Set(digest_token(&token)),
            created_at: Set(now_timestamp()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert password reset token")?;

        Ok(token)
    }

    pub async fn find(&self, raw_token: &str) -> Result<Option<PasswordResetToken>> {
        let token = password_reset_tokens::Entity::find()
            .filter(password_reset_tokens::Column::TokenHash.eq(digest_token(raw_token)))
            .one(&self.conn)
            .await
            .context("Failed to query password reset token")?;

        Ok(token.map(PasswordResetToken::from))
    }

    pub async fn delete(&self, id: i32) -> Result<()> {
        password_reset_tokens::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete password reset token")?;
        Ok(())
    }

    /// Delete the token and set the new password hash atomically.
    ///
    /// Returns `false` when the token was consumed concurrently, in which case
    /// the password is left untouched.
    pub async fn consume(&self, token: &PasswordResetToken, password_hash: String) -> Result<bool> {
        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to start password reset transaction")?;

        let deleted = password_reset_tokens::Entity::delete_by_id(token.id)
            .exec(&txn)
            .await
            .context("Failed to consume password reset token")?;

        if deleted.rows_affected == 0 {
            txn.rollback().await.ok();
            return Ok(false);
        }

        let updated = users::Entity::update_many()
            .col_expr(
                users::Column::PasswordHash,
                sea_orm::sea_query::Expr::value(password_hash),
            )
            .col_expr(
                users::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(now_timestamp()),
            )
            .filter(users::Column::Id.eq(token.user_id.value()))
            .exec(&txn)
            .await
            .context("Failed to update password")?;

        if updated.rows_affected == 0 {
            txn.rollback().await.ok();
            return Ok(false);
        }

        txn.commit()
            .await
            .context("Failed to commit password reset")?;

        Ok(true)
    }

    /// Delete every token created more than `ttl` ago.
    pub async fn prune_expired(&self, ttl: TimeDelta) -> Result<u64> {
        let cutoff = Utc::now()
            .checked_sub_signed(ttl)
            .map(format_timestamp)
            .context("Password reset cutoff is out of range")?;

        let result = password_reset_tokens::Entity::delete_many()
            .filter(password_reset_tokens::Column::CreatedAt.lt(cutoff))
            .exec(&self.conn)
            .await
            .context("Failed to prune password reset tokens")?;

        Ok(result.rows_affected)
    }
}
