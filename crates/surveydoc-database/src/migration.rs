//! Schema migrations for the PostgreSQL record store.

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::{debug, info};

use surveydoc_core::error::{AppError, ErrorKind};
use surveydoc_core::result::AppResult;

/// Migrations embedded from the workspace `migrations/` directory.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Bring the schema up to date. Returns the number of known migrations.
pub async fn run_migrations(pool: &PgPool) -> AppResult<usize> {
    let known = MIGRATOR.iter().count();
    debug!(known, "Applying record store migrations");

    MIGRATOR.run(pool).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Database,
            format!("Record store migration failed: {e}"),
            e,
        )
    })?;

    info!(migrations = known, "Record store schema is current");
    Ok(known)
}
