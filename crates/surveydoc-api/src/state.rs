//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use surveydoc_core::config::AppConfig;
use surveydoc_core::traits::storage::BlobStore;
use surveydoc_database::store::DocumentStore;
use surveydoc_service::DocumentService;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Record store, for health reporting
    pub store: Arc<dyn DocumentStore>,
    /// Blob store, for health reporting
    pub blobs: Arc<dyn BlobStore>,
    /// Document lifecycle service
    pub documents: Arc<DocumentService>,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    /// Creates the state from its shared components.
    pub fn new(
        config: Arc<AppConfig>,
        store: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        documents: Arc<DocumentService>,
    ) -> Self {
        Self {
            config,
            store,
            blobs,
            documents,
            started_at: Instant::now(),
        }
    }
}
