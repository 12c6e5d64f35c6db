use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
    sea_query::{Expr, LikeExpr, OnConflict, Query},
};
use std::collections::HashMap;

use crate::db::now_timestamp;
use crate::domain::{GroupId, UserId};
use crate::entities::{group_requests, groups, groups_users, users};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
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

impl From<groups::Model> for Group {
    fn from(model: groups::Model) -> Self {
        Self {
            id: GroupId::new(model.id),
            name: model.name,
            description: model.description,
            schedule: model.schedule,
            location: model.location,
            chronic: model.chronic,
            master: UserId::new(model.master),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewGroup {
    pub name: String,
    pub description: String,
    pub schedule: String,
    pub location: String,
    pub chronic: String,
}

/// Partial update; `None` leaves the column as is.
#[derive(Debug, Clone, Default)]
pub struct GroupPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub schedule: Option<String>,
    pub location: Option<String>,
    pub chronic: Option<String>,
}

impl GroupPatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.schedule.is_none()
            && self.location.is_none()
            && self.chronic.is_none()
    }
}

/// Public view of a user inside a group listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerProfile {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

impl From<users::Model> for PlayerProfile {
    fn from(model: users::Model) -> Self {
        Self {
            id: UserId::new(model.id),
            username: model.username,
            email: model.email,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GroupDetails {
    pub group: Group,
    pub master_user: Option<PlayerProfile>,
    /// Ordered by join time, so the master comes first.
    pub players: Vec<PlayerProfile>,
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub last_page: u64,
}

/// Listing filter. Both parts are optional and combine with AND.
#[derive(Debug, Clone, Default)]
pub struct GroupFilter {
    pub member_id: Option<UserId>,
    pub text: Option<String>,
}

impl GroupFilter {
    #[must_use]
    pub fn condition(&self) -> Condition {
        let mut condition = Condition::all();

        if let Some(member) = self.member_id {
            condition = condition.add(
                groups::Column::Id.in_subquery(
                    Query::select()
                        .column(groups_users::Column::GroupId)
                        .from(groups_users::Entity)
                        .and_where(groups_users::Column::UserId.eq(member.value()))
                        .to_owned(),
                ),
            );
        }

        if let Some(text) = self.search_text() {
            let pattern = format!("%{}%", escape_like(&fold_search(text)));
            condition = condition.add(
                Condition::any()
                    .add(
                        Expr::col(groups::Column::NameFolded)
                            .like(LikeExpr::new(pattern.clone()).escape('\\')),
                    )
                    .add(
                        Expr::col(groups::Column::DescriptionFolded)
                            .like(LikeExpr::new(pattern).escape('\\')),
                    ),
            );
        }

        condition
    }

    fn search_text(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

/// Case folding shared by the stored search columns and the query text.
pub(crate) fn fold_search(input: &str) -> String {
    input.to_lowercase()
}

fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Add a user to a roster. Existing links are left alone.
pub(crate) async fn insert_player<C: ConnectionTrait>(
    conn: &C,
    group_id: GroupId,
    user_id: UserId,
) -> Result<bool> {
    let link = groups_users::ActiveModel {
        group_id: Set(group_id.value()),
        user_id: Set(user_id.value()),
        joined_at: Set(now_timestamp()),
    };

    let inserted = groups_users::Entity::insert(link)
        .on_conflict(
            OnConflict::columns([groups_users::Column::GroupId, groups_users::Column::UserId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await
        .context("Failed to insert roster link")?;

    Ok(inserted > 0)
}

pub struct GroupRepository {
    conn: DatabaseConnection,
}

impl GroupRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: GroupId) -> Result<Option<Group>> {
        let group = groups::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query group")?;

        Ok(group.map(Group::from))
    }

    /// Insert the group and its master's roster link in one transaction.
    pub async fn create(&self, new: NewGroup, master: UserId) -> Result<Group> {
        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to start group transaction")?;
        let now = now_timestamp();

        let model = groups::ActiveModel {
            name_folded: Set(fold_search(&new.name)),
            description_folded: Set(fold_search(&new.description)),
            name: Set(new.name),
            description: Set(new.description),
            schedule: Set(new.schedule),
            location: Set(new.location),
            chronic: Set(new.chronic),
            master: Set(master.value()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert group")?;

        insert_player(&txn, GroupId::new(model.id), master).await?;

        txn.commit().await.context("Failed to commit group")?;

        Ok(Group::from(model))
    }

    pub async fn update(&self, id: GroupId, patch: GroupPatch) -> Result<Option<Group>> {
        let Some(model) = groups::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query group for update")?
        else {
            return Ok(None);
        };

        if patch.is_empty() {
            return Ok(Some(Group::from(model)));
        }

        let mut active: groups::ActiveModel = model.into();
        if let Some(name) = patch.name {
            active.name_folded = Set(fold_search(&name));
            active.name = Set(name);
        }
        if let Some(description) = patch.description {
            active.description_folded = Set(fold_search(&description));
            active.description = Set(description);
        }
        if let Some(schedule) = patch.schedule {
            active.schedule = Set(schedule);
        }
        if let Some(location) = patch.location {
            active.location = Set(location);
        }
        if let Some(chronic) = patch.chronic {
            active.chronic = Set(chronic);
        }
        active.updated_at = Set(now_timestamp());

        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update group")?;

        Ok(Some(Group::from(updated)))
    }

    /// Remove the group with its roster and requests. Returns `false` if it did not exist.
    pub async fn delete(&self, id: GroupId) -> Result<bool> {
        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to start group delete transaction")?;

        groups_users::Entity::delete_many()
            .filter(groups_users::Column::GroupId.eq(id.value()))
            .exec(&txn)
            .await
            .context("Failed to delete roster")?;

        group_requests::Entity::delete_many()
            .filter(group_requests::Column::GroupId.eq(id.value()))
            .exec(&txn)
            .await
            .context("Failed to delete group requests")?;

        let result = groups::Entity::delete_by_id(id.value())
            .exec(&txn)
            .await
            .context("Failed to delete group")?;

        txn.commit()
            .await
            .context("Failed to commit group delete")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn is_player(&self, group_id: GroupId, user_id: UserId) -> Result<bool> {
        let link = groups_users::Entity::find_by_id((group_id.value(), user_id.value()))
            .one(&self.conn)
            .await
            .context("Failed to query roster link")?;

        Ok(link.is_some())
    }

    /// Returns `false` if the user was not on the roster.
    pub async fn remove_player(&self, group_id: GroupId, user_id: UserId) -> Result<bool> {
        let result = groups_users::Entity::delete_by_id((group_id.value(), user_id.value()))
            .exec(&self.conn)
            .await
            .context("Failed to remove player")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn details(&self, id: GroupId) -> Result<Option<GroupDetails>> {
        let Some(model) = groups::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query group")?
        else {
            return Ok(None);
        };

        Ok(self.load_details(vec![model]).await?.pop())
    }

    /// `page` is 1-indexed and must be at least 1.
    pub async fn list(
        &self,
        filter: &GroupFilter,
        page: u64,
        per_page: u64,
    ) -> Result<Page<GroupDetails>> {
        let paginator = groups::Entity::find()
            .filter(filter.condition())
            .order_by_asc(groups::Column::Id)
            .paginate(&self.conn, per_page);

        let counts = paginator
            .num_items_and_pages()
            .await
            .context("Failed to count groups")?;
        let models = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .context("Failed to fetch groups page")?;

        let items = self.load_details(models).await?;

        Ok(Page {
            items,
            total: counts.number_of_items,
            page,
            per_page,
            last_page: counts.number_of_pages.max(1),
        })
    }

    async fn load_details(&self, models: Vec<groups::Model>) -> Result<Vec<GroupDetails>> {
        if models.is_empty() {
            return Ok(Vec::new());
        }

        let group_ids: Vec<i32> = models.iter().map(|g| g.id).collect();
        let master_ids: Vec<i32> = models.iter().map(|g| g.master).collect();

        let masters: HashMap<i32, PlayerProfile> = users::Entity::find()
            .filter(users::Column::Id.is_in(master_ids))
            .all(&self.conn)
            .await
            .context("Failed to load group masters")?
            .into_iter()
            .map(|u| (u.id, PlayerProfile::from(u)))
            .collect();

        let links = groups_users::Entity::find()
            .filter(groups_users::Column::GroupId.is_in(group_ids))
            .order_by_asc(groups_users::Column::JoinedAt)
            .order_by_asc(groups_users::Column::UserId)
            .find_also_related(users::Entity)
            .all(&self.conn)
            .await
            .context("Failed to load rosters")?;

        let mut rosters: HashMap<i32, Vec<PlayerProfile>> = HashMap::new();
        for (link, user) in links {
            if let Some(user) = user {
                rosters
                    .entry(link.group_id)
                    .or_default()
                    .push(PlayerProfile::from(user));
            }
        }

        Ok(models
            .into_iter()
            .map(|model| GroupDetails {
                master_user: masters.get(&model.master).cloned(),
                players: rosters.remove(&model.id).unwrap_or_default(),
                group: Group::from(model),
            })
            .collect())
    }
}
