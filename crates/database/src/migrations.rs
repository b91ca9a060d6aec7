//! Database migrations

use anyhow::Context;
use sqlx::{migrate::Migrator, SqlitePool};
use tracing::info;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Apply every pending migration from the workspace `migrations/` directory.
pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("database migrations failed")?;
    info!("database migrations applied");
    Ok(())
}
