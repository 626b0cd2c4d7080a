//! Schema migration runner for the postgres provider.

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::info;

use memberhub_core::{AppError, AppResult, ErrorKind};

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Applies every pending migration under `migrations/`.
///
/// Controlled by `store.postgres.run_migrations`; deployments that manage
/// the schema out of band leave it off.
pub async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    MIGRATOR
        .run(pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Persistence, "Schema migration failed", e))?;

    let latest = MIGRATOR.iter().map(|m| m.version).max().unwrap_or(0);
    info!(latest_version = latest, "Database schema is up to date");
    Ok(())
}
