use crate::entities::prelude::Groups as GroupsEntity;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(GroupsEntity)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Roster join table
        manager
            .create_table(
                Table::create()
                    .table(GroupsUsers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(GroupsUsers::GroupId).integer().not_null())
                    .col(ColumnDef::new(GroupsUsers::UserId).integer().not_null())
                    .col(ColumnDef::new(GroupsUsers::JoinedAt).string().not_null())
                    .primary_key(
                        Index::create()
                            .name("pk_groups_users")
                            .col(GroupsUsers::GroupId)
                            .col(GroupsUsers::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_groups_users_group_id")
                            .from(GroupsUsers::Table, GroupsUsers::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_groups_users_user_id")
                            .from(GroupsUsers::Table, GroupsUsers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_groups_users_user_id")
                    .table(GroupsUsers::Table)
                    .col(GroupsUsers::UserId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GroupsUsers::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Groups::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Groups {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum GroupsUsers {
    Table,
    GroupId,
    UserId,
    JoinedAt,
}
