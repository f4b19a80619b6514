//! Record store migration command.

use surveydoc_core::config::AppConfig;
use surveydoc_core::error::AppError;

use crate::output;

/// Apply pending migrations to the configured PostgreSQL store
pub async fn execute(config: &AppConfig) -> Result<(), AppError> {
    if config.database.is_memory() {
        output::print_warning("database.url is memory://; there is no schema to migrate.");
        return Ok(());
    }

    let pool = surveydoc_database::connect(&config.database).await?;
    let known = surveydoc_database::migration::run_migrations(&pool).await?;
    pool.close().await;
    output::print_success(&format!("Schema is current ({known} migrations)."));
    Ok(())
}
