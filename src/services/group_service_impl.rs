//! `SeaORM` implementation of the `GroupService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::config::PaginationConfig;
use crate::db::{Group, GroupDetails, GroupFilter, GroupPatch, NewGroup, Page, Store};
use crate::domain::policy::{Action, Authorizer, authorize};
use crate::domain::{GroupId, UserId};
use crate::services::group_service::{GroupError, GroupService, PageRequest};

pub struct SeaOrmGroupService {
    store: Store,
    pagination: PaginationConfig,
    authorize: Authorizer,
}

impl SeaOrmGroupService {
    #[must_use]
    pub fn new(store: Store, pagination: PaginationConfig) -> Self {
        Self {
            store,
            pagination,
            authorize,
        }
    }

    #[must_use]
    pub fn with_authorizer(mut self, authorizer: Authorizer) -> Self {
        self.authorize = authorizer;
        self
    }

    fn resolve_page(&self, request: PageRequest) -> Result<(u64, u64), GroupError> {
        let page = request.page.unwrap_or(1);
        let limit = request.limit.unwrap_or(self.pagination.default_limit);

        if page == 0 {
            return Err(GroupError::Validation("page must be at least 1".to_string()));
        }
        if limit == 0 {
            return Err(GroupError::Validation("limit must be at least 1".to_string()));
        }

        Ok((page, limit.min(self.pagination.max_limit)))
    }

    async fn find(&self, id: GroupId) -> Result<Group, GroupError> {
        self.store
            .groups()
            .get(id)
            .await?
            .ok_or(GroupError::NotFound)
    }
}

#[async_trait]
impl GroupService for SeaOrmGroupService {
    async fn list(
        &self,
        filter: GroupFilter,
        page: PageRequest,
    ) -> Result<Page<GroupDetails>, GroupError> {
        let (page, limit) = self.resolve_page(page)?;
        Ok(self.store.groups().list(&filter, page, limit).await?)
    }

    async fn get(&self, id: GroupId) -> Result<GroupDetails, GroupError> {
        self.store
            .groups()
            .details(id)
            .await?
            .ok_or(GroupError::NotFound)
    }

    async fn create(
        &self,
        actor: UserId,
        master: Option<UserId>,
        group: NewGroup,
    ) -> Result<Group, GroupError> {
        let master = master.unwrap_or(actor);
        (self.authorize)(actor, Action::CreateGroup, master)?;

        let group = self.store.groups().create(group, master).await?;
        info!(group_id = %group.id, master = %group.master, "Group created");

        Ok(group)
    }

    async fn update(
        &self,
        id: GroupId,
        actor: UserId,
        patch: GroupPatch,
    ) -> Result<Group, GroupError> {
        let group = self.find(id).await?;
        (self.authorize)(actor, Action::UpdateGroup, group.master)?;

        self.store
            .groups()
            .update(id, patch)
            .await?
            .ok_or(GroupError::NotFound)
    }

    async fn delete(&self, id: GroupId, actor: UserId) -> Result<(), GroupError> {
        let group = self.find(id).await?;
        (self.authorize)(actor, Action::DeleteGroup, group.master)?;

        if !self.store.groups().delete(id).await? {
            return Err(GroupError::NotFound);
        }

        info!(group_id = %id, "Group deleted");
        Ok(())
    }

    async fn remove_player(
        &self,
        id: GroupId,
        player: UserId,
        actor: UserId,
    ) -> Result<(), GroupError> {
        let group = self.find(id).await?;

        if player == group.master {
            return Err(GroupError::BadRequest(
                "the master cannot be removed from the group".to_string(),
            ));
        }

        (self.authorize)(actor, Action::RemovePlayer { player }, group.master)?;

        if self.store.groups().remove_player(id, player).await? {
            info!(group_id = %id, player = %player, "Player removed");
        }

        Ok(())
    }
}
