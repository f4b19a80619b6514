//! # surveydoc-database
//!
//! Record store for SurveyDoc: the [`DocumentStore`] trait, its
//! PostgreSQL implementation, an in-process implementation, connection
//! pool management, and migrations.

pub mod connection;
pub mod migration;
pub mod store;

use std::sync::Arc;

use tracing::info;

use surveydoc_core::config::DatabaseConfig;
use surveydoc_core::result::AppResult;

pub use connection::connect;
pub use store::{DocumentStore, MemoryDocumentStore, PgDocumentStore, VersionCommit};

/// Open the record store selected by the configuration.
///
/// `memory://` yields a fresh in-process store; any other URL connects to
/// PostgreSQL and applies pending migrations.
pub async fn open_store(config: &DatabaseConfig) -> AppResult<Arc<dyn DocumentStore>> {
    if config.is_memory() {
        info!("Using in-memory record store");
        return Ok(Arc::new(MemoryDocumentStore::new()));
    }

    let pool = connection::connect(config).await?;
    migration::run_migrations(&pool).await?;
    Ok(Arc::new(PgDocumentStore::new(pool)))
}
