use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, SqlErr, Statement,
};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::api_token::{ApiTokenRepository, IssuedToken};
pub use repositories::group::{
    Group, GroupDetails, GroupFilter, GroupPatch, GroupRepository, NewGroup, Page, PlayerProfile,
};
pub use repositories::group_request::{
    GroupRequest, GroupRequestDetails, GroupRequestRepository, GroupSummary, RequesterProfile,
};
pub use repositories::password_reset::{PasswordResetRepository, PasswordResetToken};
pub use repositories::user::{User, UserRepository};

/// Timestamps are RFC 3339 UTC with fixed millisecond width, so string order is time order.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[must_use]
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(value)
        .map_err(|e| anyhow::anyhow!("Invalid timestamp '{value}': {e}"))?;
    Ok(parsed.with_timezone(&Utc))
}

/// True when the error chain holds a unique constraint violation from the database.
#[must_use]
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<DbErr>()
        .is_some_and(|e| matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))))
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url
                .trim_start_matches("sqlite://")
                .trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    #[must_use]
    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn api_tokens(&self) -> ApiTokenRepository {
        ApiTokenRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn password_resets(&self) -> PasswordResetRepository {
        PasswordResetRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn groups(&self) -> GroupRepository {
        GroupRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn group_requests(&self) -> GroupRequestRepository {
        GroupRequestRepository::new(self.conn.clone())
    }
}
