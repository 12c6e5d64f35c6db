//! Group endpoints.
//!
//! Handlers only map HTTP to [`GroupService`](crate::services::GroupService)
//! calls; authorization and roster rules live in the service.

use axum::{Extension, Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::{
    IdPath, ValidatedJson, ValidatedQuery, blank_as_none, optional, require,
};
use crate::api::{ApiError, AppState, Empty, GroupDetailsDto, GroupDto, PageDto};
use crate::db::{GroupFilter, GroupPatch, NewGroup};
use crate::domain::{GroupId, UserId};
use crate::services::{GroupError, PageRequest};

impl From<GroupError> for ApiError {
    fn from(err: GroupError) -> Self {
        match err {
            GroupError::NotFound => Self::not_found("group not found"),
            GroupError::Forbidden(forbidden) => forbidden.into(),
            GroupError::BadRequest(msg) => Self::BadRequest(msg),
            GroupError::Validation(msg) => Self::validation(msg),
            GroupError::Database(msg) => Self::DatabaseError(msg),
            GroupError::Internal(msg) => Self::internal(msg),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListGroupsQuery {
    /// Only groups this user plays in.
    #[serde(default, deserialize_with = "blank_as_none")]
    pub user: Option<i32>,
    pub text: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub page: Option<u64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub schedule: Option<String>,
    pub location: Option<String>,
    pub chronic: Option<String>,
    pub master: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateGroupRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub schedule: Option<String>,
    pub location: Option<String>,
    pub chronic: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GroupsResponse {
    pub groups: PageDto<GroupDetailsDto>,
}

#[derive(Debug, Serialize)]
pub struct GroupResponse<T> {
    pub group: T,
}

/// `GET /groups?user=&text=&page=&limit=`
pub async fn list_groups(
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<ListGroupsQuery>,
) -> Result<Json<GroupsResponse>, ApiError> {
    let filter = GroupFilter {
        member_id: query.user.map(UserId::new),
        text: query.text,
    };

    let page = state
        .group_service()
        .list(
            filter,
            PageRequest {
                page: query.page,
                limit: query.limit,
            },
        )
        .await?;

    Ok(Json(GroupsResponse {
        groups: page.into(),
    }))
}

/// `GET /groups/{group_id}`
pub async fn show_group(
    State(state): State<Arc<AppState>>,
    IdPath(group_id): IdPath<i32>,
) -> Result<Json<GroupResponse<GroupDetailsDto>>, ApiError> {
    let details = state.group_service().get(GroupId::new(group_id)).await?;
    Ok(Json(GroupResponse {
        group: details.into(),
    }))
}

/// `POST /groups`
///
/// The caller becomes master and first player.
pub async fn create_group(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupResponse<GroupDto>>), ApiError> {
    let group = NewGroup {
        name: require(payload.name, "name")?,
        description: require(payload.description, "description")?,
        schedule: require(payload.schedule, "schedule")?,
        location: require(payload.location, "location")?,
        chronic: require(payload.chronic, "chronic")?,
    };

    let group = state
        .group_service()
        .create(actor, payload.master.map(UserId::new), group)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(GroupResponse {
            group: group.into(),
        }),
    ))
}

/// `PATCH /groups/{group_id}`
pub async fn update_group(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    IdPath(group_id): IdPath<i32>,
    ValidatedJson(payload): ValidatedJson<UpdateGroupRequest>,
) -> Result<Json<GroupResponse<GroupDto>>, ApiError> {
    let patch = GroupPatch {
        name: optional(payload.name, "name")?,
        description: optional(payload.description, "description")?,
        schedule: optional(payload.schedule, "schedule")?,
        location: optional(payload.location, "location")?,
        chronic: optional(payload.chronic, "chronic")?,
    };

    let group = state
        .group_service()
        .update(GroupId::new(group_id), actor, patch)
        .await?;

    Ok(Json(GroupResponse {
        group: group.into(),
    }))
}

/// `DELETE /groups/{group_id}`
pub async fn delete_group(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    IdPath(group_id): IdPath<i32>,
) -> Result<Json<Empty>, ApiError> {
    state
        .group_service()
        .delete(GroupId::new(group_id), actor)
        .await?;
    Ok(Json(Empty {}))
}

/// `DELETE /groups/{group_id}/players/{player_id}`
///
/// The master may remove anyone but themself; a player may leave.
pub async fn remove_player(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    IdPath((group_id, player_id)): IdPath<(i32, i32)>,
) -> Result<Json<Empty>, ApiError> {
    state
        .group_service()
        .remove_player(GroupId::new(group_id), UserId::new(player_id), actor)
        .await?;
    Ok(Json(Empty {}))
}
