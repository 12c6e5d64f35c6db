use anyhow::{Context, Result};
use chrono::{TimeDelta, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use sha2::{Digest, Sha256};

use crate::db::{format_timestamp, now_timestamp};
use crate::domain::UserId;
use crate::entities::api_tokens;

/// A freshly issued bearer token. `token` is the only copy of the raw value.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: String,
}

/// Stored token row as seen by the bearer middleware.
#[derive(Debug, Clone)]
pub struct ApiToken {
    pub id: i32,
    pub user_id: UserId,
    pub expires_at: String,
}

impl From<api_tokens::Model> for ApiToken {
    fn from(model: api_tokens::Model) -> Self {
        Self {
            id: model.id,
            user_id: UserId::new(model.user_id),
            expires_at: model.expires_at,
        }
    }
}

pub struct ApiTokenRepository {
    conn: DatabaseConnection,
}

impl ApiTokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn issue(&self, user_id: UserId, ttl: TimeDelta) -> Result<IssuedToken> {
        let token = generate_token();
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(ttl)
            .map(format_timestamp)
            .context("API token expiry is out of range")?;

        api_tokens::ActiveModel {
            user_id: Set(user_id.value()),
            token_hash: Set(digest_token(&token)),
            created_at: Set(format_timestamp(now)),
            expires_at: Set(expires_at.clone()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert API token")?;

        Ok(IssuedToken { token, expires_at })
    }

    pub async fn find(&self, raw_token: &str) -> Result<Option<ApiToken>> {
        let token = api_tokens::Entity::find()
            .filter(api_tokens::Column::TokenHash.eq(digest_token(raw_token)))
            .one(&self.conn)
            .await
            .context("Failed to query API token")?;

        Ok(token.map(ApiToken::from))
    }

    /// Returns `true` if a row was deleted.
    pub async fn revoke(&self, raw_token: &str) -> Result<bool> {
        let result = api_tokens::Entity::delete_many()
            .filter(api_tokens::Column::TokenHash.eq(digest_token(raw_token)))
            .exec(&self.conn)
            .await
            .context("Failed to delete API token")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn delete(&self, id: i32) -> Result<()> {
        api_tokens::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete API token")?;
        Ok(())
    }

    pub async fn prune_expired(&self) -> Result<u64> {
        let result = api_tokens::Entity::delete_many()
            .filter(api_tokens::Column::ExpiresAt.lte(now_timestamp()))
            .exec(&self.conn)
            .await
            .context("Failed to prune expired API tokens")?;

        Ok(result.rows_affected)
    }
}

/// 32 random bytes, hex encoded.
#[must_use]
pub fn generate_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Only this digest is persisted; the raw token never touches the database.
#[must_use]
pub fn digest_token(raw_token: &str) -> String {
    hex::encode(Sha256::digest(raw_token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_are_64_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_token());
    }

    #[test]
    fn digest_is_stable_and_differs_from_input() {
        let digest = digest_token("abc");
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(digest, digest_token("abc"));
        assert_ne!(digest, "abc");
    }
}
