//! In-memory blob store using `dashmap`.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use surveydoc_core::error::AppError;
use surveydoc_core::result::AppResult;
use surveydoc_core::traits::storage::{BlobMeta, BlobStore};

#[derive(Debug, Clone)]
struct StoredBlob {
    data: Bytes,
    content_type: String,
    written_at: DateTime<Utc>,
}

/// Blob store kept in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<DashMap<String, StoredBlob>>,
}

impl MemoryBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Whether the store holds no blobs.
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Insert a blob with an explicit timestamp, replacing any existing one.
    pub fn insert_at(&self, path: &str, data: Bytes, content_type: &str, at: DateTime<Utc>) {
        self.blobs.insert(
            path.to_string(),
            StoredBlob {
                data,
                content_type: content_type.to_string(),
                written_at: at,
            },
        );
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn put(&self, path: &str, data: Bytes, content_type: &str) -> AppResult<()> {
        match self.blobs.entry(path.to_string()) {
            Entry::Occupied(_) => Err(AppError::conflict(format!("Blob already exists: {path}"))),
            Entry::Vacant(slot) => {
                slot.insert(StoredBlob {
                    data,
                    content_type: content_type.to_string(),
                    written_at: Utc::now(),
                });
                Ok(())
            }
        }
    }

    async fn get(&self, path: &str) -> AppResult<Bytes> {
        self.blobs
            .get(path)
            .map(|blob| blob.data.clone())
            .ok_or_else(|| AppError::not_found(format!("Blob not found: {path}")))
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        self.blobs.remove(path);
        Ok(())
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        Ok(self.blobs.contains_key(path))
    }

    async fn list(&self, prefix: &str) -> AppResult<Vec<BlobMeta>> {
        let mut entries: Vec<BlobMeta> = self
            .blobs
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| BlobMeta {
                path: entry.key().clone(),
                size_bytes: entry.data.len() as u64,
                content_type: Some(entry.content_type.clone()),
                last_modified: Some(entry.written_at),
            })
            .collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }
}
