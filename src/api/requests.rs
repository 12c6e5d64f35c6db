//! Join request endpoints, nested under a group.

use axum::{Extension, Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::{IdPath, ValidatedQuery, blank_as_none, validate_positive_id};
use crate::api::{ApiError, AppState, Empty, GroupRequestDetailsDto, GroupRequestDto};
use crate::domain::{GroupId, RequestId, UserId};
use crate::services::MembershipError;

impl From<MembershipError> for ApiError {
    fn from(err: MembershipError) -> Self {
        match err {
            MembershipError::GroupNotFound => Self::not_found("group not found"),
            MembershipError::RequestNotFound => Self::not_found("group request not found"),
            MembershipError::Forbidden(forbidden) => forbidden.into(),
            MembershipError::Conflict(msg) => Self::Conflict(msg),
            err @ MembershipError::AlreadyMember => Self::validation(err.to_string()),
            MembershipError::Database(msg) => Self::DatabaseError(msg),
            MembershipError::Internal(msg) => Self::internal(msg),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListRequestsQuery {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub master: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRequestResponse {
    pub group_request: GroupRequestDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRequestsResponse {
    pub group_requests: Vec<GroupRequestDetailsDto>,
}

/// `POST /groups/{group_id}/requests`
///
/// The caller asks to join the group.
pub async fn create_request(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    IdPath(group_id): IdPath<i32>,
) -> Result<(StatusCode, Json<GroupRequestResponse>), ApiError> {
    let request = state
        .membership_service()
        .create_request(GroupId::new(group_id), actor)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(GroupRequestResponse {
            group_request: request.into(),
        }),
    ))
}

/// `GET /groups/{group_id}/requests?master=`
///
/// Empty list unless `master` is the group's master.
pub async fn list_requests(
    State(state): State<Arc<AppState>>,
    IdPath(group_id): IdPath<i32>,
    ValidatedQuery(query): ValidatedQuery<ListRequestsQuery>,
) -> Result<Json<GroupRequestsResponse>, ApiError> {
    let master = validate_positive_id(query.master, "master")?;

    let requests = state
        .membership_service()
        .list_requests(GroupId::new(group_id), UserId::new(master))
        .await?;

    Ok(Json(GroupRequestsResponse {
        group_requests: requests.into_iter().map(Into::into).collect(),
    }))
}

/// `POST /groups/{group_id}/requests/{request_id}/accept`
pub async fn accept_request(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    IdPath((group_id, request_id)): IdPath<(i32, i32)>,
) -> Result<Json<GroupRequestResponse>, ApiError> {
    let request = state
        .membership_service()
        .accept_request(GroupId::new(group_id), RequestId::new(request_id), actor)
        .await?;

    Ok(Json(GroupRequestResponse {
        group_request: request.into(),
    }))
}

/// `DELETE /groups/{group_id}/requests/{request_id}`
///
/// Rejection by the master or withdrawal by the requester.
pub async fn reject_request(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    IdPath((group_id, request_id)): IdPath<(i32, i32)>,
) -> Result<Json<Empty>, ApiError> {
    state
        .membership_service()
        .reject_request(GroupId::new(group_id), RequestId::new(request_id), actor)
        .await?;
    Ok(Json(Empty {}))
}
