use anyhow::{Context, Result, anyhow};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait, sea_query::Expr,
};
use std::str::FromStr;

use super::group::insert_player;
use crate::db::{is_unique_violation, now_timestamp};
use crate::domain::{GroupId, RequestId, RequestStatus, UserId};
use crate::entities::{group_requests, groups, users};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRequest {
    pub id: RequestId,
    pub user_id: UserId,
    pub group_id: GroupId,
    pub status: RequestStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<group_requests::Model> for GroupRequest {
    type Error = anyhow::Error;

    fn try_from(model: group_requests::Model) -> Result<Self> {
        let status = RequestStatus::from_str(&model.status)
            .map_err(|e| anyhow!("Group request {} has {e}", model.id))?;

        Ok(Self {
            id: RequestId::new(model.id),
            user_id: UserId::new(model.user_id),
            group_id: GroupId::new(model.group_id),
            status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSummary {
    pub id: GroupId,
    pub name: String,
    pub master: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequesterProfile {
    pub id: UserId,
    pub username: String,
}

#[derive(Debug, Clone)]
pub struct GroupRequestDetails {
    pub request: GroupRequest,
    pub group: GroupSummary,
    pub user: RequesterProfile,
}

pub struct GroupRequestRepository {
    conn: DatabaseConnection,
}

impl GroupRequestRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: RequestId) -> Result<Option<GroupRequest>> {
        group_requests::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query group request")?
            .map(GroupRequest::try_from)
            .transpose()
    }

    pub async fn find_pending(
        &self,
        user_id: UserId,
        group_id: GroupId,
    ) -> Result<Option<GroupRequest>> {
        group_requests::Entity::find()
            .filter(group_requests::Column::UserId.eq(user_id.value()))
            .filter(group_requests::Column::GroupId.eq(group_id.value()))
            .filter(group_requests::Column::Status.eq(RequestStatus::Pending.as_str()))
            .one(&self.conn)
            .await
            .context("Failed to query pending group request")?
            .map(GroupRequest::try_from)
            .transpose()
    }

    /// Insert a PENDING request. Returns `None` when the pending-pair index
    /// rejects it because another pending request for the pair already exists.
    pub async fn create_pending(
        &self,
        user_id: UserId,
        group_id: GroupId,
    ) -> Result<Option<GroupRequest>> {
        let now = now_timestamp();

        let inserted = group_requests::ActiveModel {
            user_id: Set(user_id.value()),
            group_id: Set(group_id.value()),
            status: Set(RequestStatus::Pending.as_str().to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await;

        match inserted.context("Failed to insert group request") {
            Ok(model) => Ok(Some(GroupRequest::try_from(model)?)),
            Err(err) if is_unique_violation(&err) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Requests of a group that is owned by `master`, oldest first.
    /// Empty when the group does not exist or belongs to someone else.
    pub async fn list_for_master(
        &self,
        group_id: GroupId,
        master: UserId,
    ) -> Result<Vec<GroupRequestDetails>> {
        let Some(group) = groups::Entity::find_by_id(group_id.value())
            .filter(groups::Column::Master.eq(master.value()))
            .one(&self.conn)
            .await
            .context("Failed to query group for request listing")?
        else {
            return Ok(Vec::new());
        };

        let rows = group_requests::Entity::find()
            .filter(group_requests::Column::GroupId.eq(group.id))
            .filter(group_requests::Column::Status.is_in([
                RequestStatus::Pending.as_str(),
                RequestStatus::Accepted.as_str(),
            ]))
            .order_by_asc(group_requests::Column::Id)
            .find_also_related(users::Entity)
            .all(&self.conn)
            .await
            .context("Failed to query group requests")?;

        let summary = GroupSummary {
            id: GroupId::new(group.id),
            name: group.name,
            master: UserId::new(group.master),
        };

        let mut details = Vec::with_capacity(rows.len());
        for (request, user) in rows {
            let Some(user) = user else {
                continue;
            };
            details.push(GroupRequestDetails {
                request: GroupRequest::try_from(request)?,
                group: summary.clone(),
                user: RequesterProfile {
                    id: UserId::new(user.id),
                    username: user.username,
                },
            });
        }

        Ok(details)
    }

    /// Mark the request ACCEPTED and add its user to the roster, atomically.
    ///
    /// The status update is guarded on PENDING, so two concurrent accepts
    /// cannot both succeed. Returns `None` if the request was no longer pending.
    pub async fn accept(&self, request: &GroupRequest) -> Result<Option<GroupRequest>> {
        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to start accept transaction")?;
        let now = now_timestamp();

        let updated = group_requests::Entity::update_many()
            .col_expr(
                group_requests::Column::Status,
                Expr::value(RequestStatus::Accepted.as_str()),
            )
            .col_expr(group_requests::Column::UpdatedAt, Expr::value(now.clone()))
            .filter(group_requests::Column::Id.eq(request.id.value()))
            .filter(group_requests::Column::Status.eq(RequestStatus::Pending.as_str()))
            .exec(&txn)
            .await
            .context("Failed to update group request status")?;

        if updated.rows_affected == 0 {
            txn.rollback().await.ok();
            return Ok(None);
        }

        insert_player(&txn, request.group_id, request.user_id).await?;

        txn.commit()
            .await
            .context("Failed to commit accepted request")?;

        Ok(Some(GroupRequest {
            status: RequestStatus::Accepted,
            updated_at: now,
            ..request.clone()
        }))
    }

    /// Returns `false` if the row was already gone.
    pub async fn delete(&self, id: RequestId) -> Result<bool> {
        let result = group_requests::Entity::delete_by_id(id.value())
            .exec(&self.conn)
            .await
            .context("Failed to delete group request")?;

        Ok(result.rows_affected > 0)
    }
}
