//! Blob store trait for pluggable version-content backends.

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;

/// Metadata about a stored blob.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BlobMeta {
    /// Path within the store.
    pub path: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Content type recorded at upload time, if the backend keeps one.
    pub content_type: Option<String>,
    /// Last modified timestamp.
    pub last_modified: Option<chrono::DateTime<chrono::Utc>>,
}

/// Trait for blob storage backends holding document version content.
///
/// Implementations exist for the local filesystem, S3 and memory. Paths
/// are `/`-separated and relative to the store root.
#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local", "s3").
    fn provider_type(&self) -> &str;

    /// Check whether the store is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Write a new blob.
    ///
    /// Blobs are immutable: if an object already exists at `path` the write
    /// fails with [`ErrorKind::Conflict`](crate::error::ErrorKind::Conflict)
    /// and the existing object is left untouched.
    async fn put(&self, path: &str, data: Bytes, content_type: &str) -> AppResult<()>;

    /// Read a blob into memory. Missing blobs yield `NotFound`.
    async fn get(&self, path: &str) -> AppResult<Bytes>;

    /// Delete a blob. Deleting a missing blob is not an error.
    async fn delete(&self, path: &str) -> AppResult<()>;

    /// Check whether a blob exists.
    async fn exists(&self, path: &str) -> AppResult<bool>;

    /// List every blob whose path starts with `prefix`, sorted by path.
    async fn list(&self, prefix: &str) -> AppResult<Vec<BlobMeta>>;
}
