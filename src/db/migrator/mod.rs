use sea_orm_migration::prelude::*;

mod m20230201_create_users;
mod m20230205_create_groups;
mod m20230210_create_password_reset_tokens;
mod m20230213_create_group_requests;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20230201_create_users::Migration),
            Box::new(m20230205_create_groups::Migration),
            Box::new(m20230210_create_password_reset_tokens::Migration),
            Box::new(m20230213_create_group_requests::Migration),
        ]
    }
}
