//! Groups and their rosters.

use thiserror::Error;

use crate::db::{Group, GroupDetails, GroupFilter, GroupPatch, NewGroup, Page};
use crate::domain::policy::Forbidden;
use crate::domain::{GroupId, UserId};

#[derive(Debug, Error)]
pub enum GroupError {
    #[error("group not found")]
    NotFound,

    #[error(transparent)]
    Forbidden(#[from] Forbidden),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for GroupError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for GroupError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// Requested page; either part falls back to the configured default.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageRequest {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[async_trait::async_trait]
pub trait GroupService: Send + Sync {
    /// Pages through groups matching `filter`, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::Validation`] for a page or limit of zero.
    async fn list(
        &self,
        filter: GroupFilter,
        page: PageRequest,
    ) -> Result<Page<GroupDetails>, GroupError>;

    async fn get(&self, id: GroupId) -> Result<GroupDetails, GroupError>;

    /// Creates a group owned by `actor`, who becomes its first player.
    /// `master`, when given, must name the actor.
    async fn create(
        &self,
        actor: UserId,
        master: Option<UserId>,
        group: NewGroup,
    ) -> Result<Group, GroupError>;

    async fn update(
        &self,
        id: GroupId,
        actor: UserId,
        patch: GroupPatch,
    ) -> Result<Group, GroupError>;

    async fn delete(&self, id: GroupId, actor: UserId) -> Result<(), GroupError>;

    /// Takes a player off the roster. The master can never be removed.
    ///
    /// # Errors
    ///
    /// [`GroupError::BadRequest`] when `player` is the master.
    async fn remove_player(
        &self,
        id: GroupId,
        player: UserId,
        actor: UserId,
    ) -> Result<(), GroupError>;
}
