use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    GroupService, IdentityService, LogMailer, MailQueue, Mailer, MembershipService,
    SeaOrmGroupService, SeaOrmIdentityService, SeaOrmMembershipService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub identity_service: Arc<dyn IdentityService>,

    pub group_service: Arc<dyn GroupService>,

    pub membership_service: Arc<dyn MembershipService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::with_mailer(config, Arc::new(LogMailer)).await
    }

    /// Like [`SharedState::new`] with a custom mail sink.
    pub async fn with_mailer(config: Config, mailer: Arc<dyn Mailer>) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Ok(Self::from_parts(config, store, mailer))
    }

    #[must_use]
    pub fn from_parts(config: Config, store: Store, mailer: Arc<dyn Mailer>) -> Self {
        let mail_queue = Arc::new(MailQueue::start(mailer, &config.mail));

        let identity_service = Arc::new(SeaOrmIdentityService::new(
            store.clone(),
            config.security.clone(),
            mail_queue,
        )) as Arc<dyn IdentityService>;

        let group_service = Arc::new(SeaOrmGroupService::new(
            store.clone(),
            config.pagination.clone(),
        )) as Arc<dyn GroupService>;

        let membership_service = Arc::new(SeaOrmMembershipService::new(store.clone()))
            as Arc<dyn MembershipService>;

        Self {
            config: Arc::new(config),
            store,
            identity_service,
            group_service,
            membership_service,
        }
    }
}
