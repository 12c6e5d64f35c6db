use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{IdentityService, LogMailer, MailQueue, SeaOrmIdentityService};

pub async fn cmd_prune(config: &Config) -> anyhow::Result<()> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let mail = Arc::new(MailQueue::start(Arc::new(LogMailer), &config.mail));
    let identity = SeaOrmIdentityService::new(store, config.security.clone(), mail);

    let report = identity.prune_expired_tokens().await?;

    println!("Expired API tokens removed:      {}", report.api_tokens);
    println!("Expired reset tokens removed:    {}", report.reset_tokens);
    Ok(())
}
