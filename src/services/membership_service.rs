//! Join requests: a user asks to join a group, the master accepts or rejects.
//!
//! A request is created PENDING. Accepting it marks it ACCEPTED and puts the
//! requester on the roster in the same transaction; nothing leaves ACCEPTED.
//! Rejection and withdrawal delete the row.

use thiserror::Error;

use crate::db::{GroupRequest, GroupRequestDetails};
use crate::domain::policy::Forbidden;
use crate::domain::{GroupId, RequestId, UserId};

#[derive(Debug, Error)]
pub enum MembershipError {
    #[error("group not found")]
    GroupNotFound,

    #[error("group request not found")]
    RequestNotFound,

    #[error(transparent)]
    Forbidden(#[from] Forbidden),

    #[error("{0}")]
    Conflict(String),

    #[error("user is already a player of this group")]
    AlreadyMember,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for MembershipError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for MembershipError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

#[async_trait::async_trait]
pub trait MembershipService: Send + Sync {
    /// # Errors
    ///
    /// [`MembershipError::Conflict`] if a pending request for the pair exists,
    /// [`MembershipError::AlreadyMember`] if the user is on the roster.
    async fn create_request(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> Result<GroupRequest, MembershipError>;

    /// Empty unless `master` really is the group's master.
    async fn list_requests(
        &self,
        group_id: GroupId,
        master: UserId,
    ) -> Result<Vec<GroupRequestDetails>, MembershipError>;

    async fn accept_request(
        &self,
        group_id: GroupId,
        request_id: RequestId,
        actor: UserId,
    ) -> Result<GroupRequest, MembershipError>;

    /// Rejection by the master or withdrawal by the requester.
    async fn reject_request(
        &self,
        group_id: GroupId,
        request_id: RequestId,
        actor: UserId,
    ) -> Result<(), MembershipError>;
}
