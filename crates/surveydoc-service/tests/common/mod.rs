//! Test harness: in-memory stores wrapped with scriptable faults.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;

use surveydoc_core::config::versioning::{RetryConfig, VersioningConfig};
use surveydoc_core::error::{AppError, ErrorKind};
use surveydoc_core::result::AppResult;
use surveydoc_core::traits::storage::{BlobMeta, BlobStore};
use surveydoc_database::MemoryDocumentStore;
use surveydoc_database::store::{DocumentStore, VersionCommit};
use surveydoc_entity::document::{DocumentKey, DocumentMetadata, DocumentVersion, NewDocument};
use surveydoc_service::{DocumentUpdate, RequestContext, VersioningService};
use surveydoc_storage::MemoryBlobStore;

/// Another writer's full update, run right after a metadata read.
pub struct Interleave {
    pub service: VersioningService,
    pub ctx: RequestContext,
    pub update: DocumentUpdate,
}

/// Record store with injectable commit failures and interleavings.
#[derive(Default)]
pub struct FaultyDocumentStore {
    pub inner: MemoryDocumentStore,
    commit_faults: Mutex<VecDeque<ErrorKind>>,
    interleave: Mutex<Option<Interleave>>,
    lose_after_commit: AtomicBool,
    blind_after_fault: AtomicBool,
    blind: AtomicBool,
    pub commits: AtomicUsize,
}

impl std::fmt::Debug for FaultyDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaultyDocumentStore").finish_non_exhaustive()
    }
}

impl FaultyDocumentStore {
    /// Fail the next commits with the given kinds, in order.
    pub fn fail_commits(&self, kinds: impl IntoIterator<Item = ErrorKind>) {
        self.commit_faults.lock().unwrap().extend(kinds);
    }

    /// Run `other` to completion right after the next metadata read.
    pub fn interleave(&self, other: Interleave) {
        *self.interleave.lock().unwrap() = Some(other);
    }

    /// Fail the first metadata read after the next injected commit fault,
    /// so the writer cannot tell whether its commit landed.
    pub fn fail_read_after_next_fault(&self) {
        self.blind_after_fault.store(true, Ordering::SeqCst);
    }

    /// Report the document as missing once any commit has succeeded.
    pub fn lose_after_commit(&self) {
        self.lose_after_commit.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for FaultyDocumentStore {
    fn backend(&self) -> &str {
        "faulty"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn get_latest(&self, key: &DocumentKey) -> AppResult<Option<DocumentMetadata>> {
        if self.blind.swap(false, Ordering::SeqCst) {
            return Err(AppError::database("injected read failure"));
        }
        if self.lose_after_commit.load(Ordering::SeqCst) && self.commits.load(Ordering::SeqCst) > 0
        {
            return Ok(None);
        }
        let snapshot = self.inner.get_latest(key).await?;
        let other = self.interleave.lock().unwrap().take();
        if let Some(other) = other {
            other
                .service
                .apply_update(&other.ctx, key, &other.update)
                .await
                .map_err(AppError::from)?;
        }
        Ok(snapshot)
    }

    async fn list_versions(&self, key: &DocumentKey) -> AppResult<Vec<DocumentVersion>> {
        self.inner.list_versions(key).await
    }

    async fn get_version(
        &self,
        key: &DocumentKey,
        version: i64,
    ) -> AppResult<Option<DocumentVersion>> {
        self.inner.get_version(key, version).await
    }

    async fn list_documents(&self, tenant_id: &str) -> AppResult<Vec<DocumentKey>> {
        self.inner.list_documents(tenant_id).await
    }

    async fn create_document(
        &self,
        metadata: &DocumentMetadata,
        initial: Option<&DocumentVersion>,
    ) -> AppResult<()> {
        self.inner.create_document(metadata, initial).await
    }

    async fn commit_version(&self, commit: &VersionCommit) -> AppResult<()> {
        let fault = self.commit_faults.lock().unwrap().pop_front();
        if let Some(kind) = fault {
            if self.blind_after_fault.swap(false, Ordering::SeqCst) {
                self.blind.store(true, Ordering::SeqCst);
            }
            return Err(AppError::new(kind, "injected commit failure"));
        }
        self.inner.commit_version(commit).await?;
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_document(&self, key: &DocumentKey) -> AppResult<bool> {
        self.inner.delete_document(key).await
    }
}

/// Blob store whose uploads and listings can be made to fail.
#[derive(Debug, Default)]
pub struct FaultyBlobStore {
    pub inner: MemoryBlobStore,
    fail_puts: AtomicBool,
    fail_lists: AtomicBool,
}

impl FaultyBlobStore {
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_lists(&self, fail: bool) {
        self.fail_lists.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlobStore for FaultyBlobStore {
    fn provider_type(&self) -> &str {
        "faulty"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn put(&self, path: &str, data: Bytes, content_type: &str) -> AppResult<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(AppError::storage("injected upload failure"));
        }
        self.inner.put(path, data, content_type).await
    }

    async fn get(&self, path: &str) -> AppResult<Bytes> {
        self.inner.get(path).await
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        self.inner.delete(path).await
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        self.inner.exists(path).await
    }

    async fn list(&self, prefix: &str) -> AppResult<Vec<BlobMeta>> {
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(AppError::storage("injected listing failure"));
        }
        self.inner.list(prefix).await
    }
}

/// Stores plus a versioning service over them.
pub struct Harness {
    pub documents: Arc<FaultyDocumentStore>,
    pub blobs: Arc<FaultyBlobStore>,
    pub service: VersioningService,
}

impl Harness {
    pub fn new(max_versions: usize) -> Self {
        let documents = Arc::new(FaultyDocumentStore::default());
        let blobs = Arc::new(FaultyBlobStore::default());
        let service = VersioningService::new(
            documents.clone(),
            blobs.clone(),
            config(max_versions),
            "text/html",
        );
        Self {
            documents,
            blobs,
            service,
        }
    }

    /// A second writer sharing the same underlying state, without faults.
    pub fn rival(&self) -> VersioningService {
        VersioningService::new(
            Arc::new(self.documents.inner.clone()),
            Arc::new(self.blobs.inner.clone()),
            config(10),
            "text/html",
        )
    }

    /// Creates a document owned by `alice` with `bob` as editor.
    pub async fn seed(&self, key: &DocumentKey, file_type: &str) {
        let meta = DocumentMetadata::new(
            key.clone(),
            NewDocument {
                file_name: "survey".into(),
                editors: vec!["bob".into()],
                ..Default::default()
            },
            file_type.to_string(),
            "alice",
            Utc::now(),
        );
        self.documents.inner.create_document(&meta, None).await.unwrap();
    }

    pub async fn current_version(&self, key: &DocumentKey) -> i64 {
        self.documents
            .inner
            .get_latest(key)
            .await
            .unwrap()
            .unwrap()
            .current_version
    }

    pub async fn version_numbers(&self, key: &DocumentKey) -> Vec<i64> {
        self.documents
            .inner
            .list_versions(key)
            .await
            .unwrap()
            .iter()
            .map(|v| v.version)
            .collect()
    }
}

pub fn config(max_versions: usize) -> VersioningConfig {
    VersioningConfig {
        max_versions,
        retry: RetryConfig {
            max_attempts: 3,
            base_delay_ms: 1,
            max_delay_ms: 5,
        },
        orphan_reclaim_seconds: 60,
    }
}

pub fn key(document_id: &str) -> DocumentKey {
    DocumentKey::new("acme", document_id).unwrap()
}

pub fn alice() -> RequestContext {
    RequestContext::new("alice", None)
}

pub fn bob() -> RequestContext {
    RequestContext::new("bob", None)
}
