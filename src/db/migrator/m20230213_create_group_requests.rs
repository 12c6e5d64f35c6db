use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Only one PENDING request may exist per (user, group); accepted rows are unconstrained.
const PENDING_UNIQUE_INDEX: &str = "CREATE UNIQUE INDEX IF NOT EXISTS \
     idx_group_requests_pending_pair ON group_requests (user_id, group_id) \
     WHERE status = 'PENDING'";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GroupRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupRequests::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GroupRequests::UserId).integer().not_null())
                    .col(ColumnDef::new(GroupRequests::GroupId).integer().not_null())
                    .col(
                        ColumnDef::new(GroupRequests::Status)
                            .string_len(16)
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(ColumnDef::new(GroupRequests::CreatedAt).string().not_null())
                    .col(ColumnDef::new(GroupRequests::UpdatedAt).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_requests_user_id")
                            .from(GroupRequests::Table, GroupRequests::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_requests_group_id")
                            .from(GroupRequests::Table, GroupRequests::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_group_requests_group_id")
                    .table(GroupRequests::Table)
                    .col(GroupRequests::GroupId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(PENDING_UNIQUE_INDEX)
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GroupRequests::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum GroupRequests {
    Table,
    Id,
    UserId,
    GroupId,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Groups {
    Table,
    Id,
}
