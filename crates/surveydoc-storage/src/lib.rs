//! # surveydoc-storage
//!
//! Blob store implementations for SurveyDoc version content. Supports the
//! local filesystem, S3-compatible object stores (feature `s3`), and an
//! in-memory store.

pub mod providers;

use std::sync::Arc;

use tracing::info;

use surveydoc_core::config::storage::StorageConfig;
use surveydoc_core::error::AppError;
use surveydoc_core::result::AppResult;
use surveydoc_core::traits::storage::BlobStore;

pub use providers::{LocalBlobStore, MemoryBlobStore};

/// Build the blob store selected by `storage.provider`.
pub async fn build_blob_store(config: &StorageConfig) -> AppResult<Arc<dyn BlobStore>> {
    info!(provider = %config.provider, "Initializing blob store");
    match config.provider.as_str() {
        "local" => Ok(Arc::new(LocalBlobStore::new(&config.local.root_path).await?)),
        "memory" => Ok(Arc::new(MemoryBlobStore::new())),
        #[cfg(feature = "s3")]
        "s3" => Ok(Arc::new(providers::s3::S3BlobStore::new(&config.s3).await?)),
        #[cfg(not(feature = "s3"))]
        "s3" => Err(AppError::configuration(
            "The s3 provider requires building with the `s3` feature",
        )),
        other => Err(AppError::configuration(format!(
            "Unknown storage provider '{other}'"
        ))),
    }
}
