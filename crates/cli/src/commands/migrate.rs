//! Migrate command - create the social account schema

use anyhow::{Context, Result};
use social_autopilot_adapters::store::SqliteSocialAccountStore;
use std::path::PathBuf;

use crate::args::MigrateArgs;
use crate::config::AppConfig;

pub async fn execute(args: MigrateArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let path = args
        .database_path
        .unwrap_or_else(|| config.general.database_path.clone());

    let store = SqliteSocialAccountStore::new(&path)
        .await
        .with_context(|| format!("Failed to migrate database: {}", path.display()))?;
    let accounts = store.count().await.context("Failed to count social accounts")?;

    tracing::info!(path = %path.display(), accounts = accounts, "Migration complete");
    println!("Database ready: {} ({} social accounts)", path.display(), accounts);
    Ok(())
}
