use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    pub description: String,

    pub schedule: String,

    pub location: String,

    pub chronic: String,

    /// Lowercased copies of `name`/`description` for text search.
    /// SQLite's `LOWER` only folds ASCII, so folding happens on write.
    pub name_folded: String,

    pub description_folded: String,

    /// Owning user; always present in the roster
    pub master: i32,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::Master",
        to = "super::users::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    MasterUser,
    #[sea_orm(has_many = "super::groups_users::Entity")]
    Players,
    #[sea_orm(has_many = "super::group_requests::Entity")]
    Requests,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MasterUser.def()
    }
}

impl Related<super::groups_users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Players.def()
    }
}

impl Related<super::group_requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Requests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
