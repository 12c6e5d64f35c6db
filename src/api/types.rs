use serde::Serialize;

use crate::db::{
    Group, GroupDetails, GroupRequest, GroupRequestDetails, GroupSummary, IssuedToken, Page,
    PlayerProfile, RequesterProfile, User,
};
use crate::domain::{GroupId, RequestId, RequestStatus, UserId};

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub status: u16,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct Empty {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDto {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub token: String,
    pub expires_at: String,
}

impl From<IssuedToken> for TokenDto {
    fn from(token: IssuedToken) -> Self {
        Self {
            kind: "bearer",
            token: token.token,
            expires_at: token.expires_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDto {
    pub id: GroupId,
    pub name: String,
    pub description: String,
    pub schedule: String,
    pub location: String,
    pub chronic: String,
    pub master: UserId,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Group> for GroupDto {
    fn from(group: Group) -> Self {
        Self {
            id: group.id,
            name: group.name,
            description: group.description,
            schedule: group.schedule,
            location: group.location,
            chronic: group.chronic,
            master: group.master,
            created_at: group.created_at,
            updated_at: group.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlayerDto {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

impl From<PlayerProfile> for PlayerDto {
    fn from(player: PlayerProfile) -> Self {
        Self {
            id: player.id,
            username: player.username,
            email: player.email,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDetailsDto {
    #[serde(flatten)]
    pub group: GroupDto,
    pub master_user: Option<PlayerDto>,
    pub players: Vec<PlayerDto>,
}

impl From<GroupDetails> for GroupDetailsDto {
    fn from(details: GroupDetails) -> Self {
        Self {
            group: details.group.into(),
            master_user: details.master_user.map(PlayerDto::from),
            players: details.players.into_iter().map(PlayerDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: u64,
    pub per_page: u64,
    pub current_page: u64,
    pub last_page: u64,
    pub first_page: u64,
}

#[derive(Debug, Serialize)]
pub struct PageDto<T> {
    pub meta: PageMeta,
    pub data: Vec<T>,
}

impl<T, U: From<T>> From<Page<T>> for PageDto<U> {
    fn from(page: Page<T>) -> Self {
        Self {
            meta: PageMeta {
                total: page.total,
                per_page: page.per_page,
                current_page: page.page,
                last_page: page.last_page,
                first_page: 1,
            },
            data: page.items.into_iter().map(U::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRequestDto {
    pub id: RequestId,
    pub user_id: UserId,
    pub group_id: GroupId,
    pub status: RequestStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<GroupRequest> for GroupRequestDto {
    fn from(request: GroupRequest) -> Self {
        Self {
            id: request.id,
            user_id: request.user_id,
            group_id: request.group_id,
            status: request.status,
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GroupSummaryDto {
    pub id: GroupId,
    pub name: String,
    pub master: UserId,
}

impl From<GroupSummary> for GroupSummaryDto {
    fn from(group: GroupSummary) -> Self {
        Self {
            id: group.id,
            name: group.name,
            master: group.master,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RequesterDto {
    pub id: UserId,
    pub username: String,
}

impl From<RequesterProfile> for RequesterDto {
    fn from(user: RequesterProfile) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GroupRequestDetailsDto {
    #[serde(flatten)]
    pub request: GroupRequestDto,
    pub group: GroupSummaryDto,
    pub user: RequesterDto,
}

impl From<GroupRequestDetails> for GroupRequestDetailsDto {
    fn from(details: GroupRequestDetails) -> Self {
        Self {
            request: details.request.into(),
            group: details.group.into(),
            user: details.user.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn page_meta_is_camel_case_and_one_indexed() {
        let page = Page {
            items: vec![Group {
                id: GroupId::new(3),
                name: "Tuesday".to_string(),
                description: "Curse of Strahd".to_string(),
                schedule: "Tue 19h".to_string(),
                location: "Library".to_string(),
                chronic: String::new(),
                master: UserId::new(1),
                created_at: "t0".to_string(),
                updated_at: "t1".to_string(),
            }],
            total: 11,
            page: 2,
            per_page: 5,
            last_page: 3,
        };

        let dto: PageDto<GroupDto> = page.into();
        let value = serde_json::to_value(&dto).unwrap();

        assert_eq!(
            value["meta"],
            json!({"total": 11, "perPage": 5, "currentPage": 2, "lastPage": 3, "firstPage": 1})
        );
        assert_eq!(value["data"][0]["master"], 1);
        assert_eq!(value["data"][0]["createdAt"], "t0");
    }

    #[test]
    fn token_uses_type_field() {
        let dto = TokenDto::from(IssuedToken {
            token: "abc".to_string(),
            expires_at: "soon".to_string(),
        });
        let value = serde_json::to_value(&dto).unwrap();
        assert_eq!(value, json!({"type": "bearer", "token": "abc", "expiresAt": "soon"}));
    }

    #[test]
    fn request_details_flatten_request_fields() {
        let dto = GroupRequestDetailsDto::from(GroupRequestDetails {
            request: GroupRequest {
                id: RequestId::new(9),
                user_id: UserId::new(2),
                group_id: GroupId::new(4),
                status: RequestStatus::Pending,
                created_at: "c".to_string(),
                updated_at: "u".to_string(),
            },
            group: GroupSummary {
                id: GroupId::new(4),
                name: "Table".to_string(),
                master: UserId::new(1),
            },
            user: RequesterProfile {
                id: UserId::new(2),
                username: "frodo".to_string(),
            },
        });

        let value = serde_json::to_value(&dto).unwrap();
        assert_eq!(value["id"], 9);
        assert_eq!(value["userId"], 2);
        assert_eq!(value["status"], "PENDING");
        assert_eq!(value["group"], json!({"id": 4, "name": "Table", "master": 1}));
        assert_eq!(value["user"], json!({"id": 2, "username": "frodo"}));
    }
}
