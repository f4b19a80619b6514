//! Document record store: one `#LATEST` metadata record plus `v<N>`
//! version records per document.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use surveydoc_core::result::AppResult;
use surveydoc_entity::document::{DocumentKey, DocumentMetadata, DocumentVersion};

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

/// One atomic versioning write.
///
/// Applied all-or-nothing: the metadata advance is conditioned on
/// `expected_version`, the new record is inserted, and the pruned records
/// are deleted.
#[derive(Debug, Clone)]
pub struct VersionCommit {
    /// Document being advanced.
    pub key: DocumentKey,
    /// Version the metadata must still be at for the commit to apply.
    pub expected_version: i64,
    /// Record to insert; its `version` becomes the new current version and
    /// its `file_size` the new document size.
    pub version: DocumentVersion,
    /// Version numbers of the records to delete.
    pub prune: Vec<i64>,
    /// Timestamp written to `last_modified` and `updated_at`.
    pub committed_at: DateTime<Utc>,
}

/// Transactional key-sorted store for document records.
///
/// Error contract shared by all implementations:
/// - a failed `expected_version` check or an already existing document
///   yields `ErrorKind::Conflict`;
/// - a missing document on commit yields `ErrorKind::NotFound`;
/// - anything else yields `ErrorKind::Database`.
#[async_trait]
pub trait DocumentStore: Send + Sync + std::fmt::Debug + 'static {
    /// Backend name (e.g., "postgres", "memory").
    fn backend(&self) -> &str;

    /// Check whether the store is reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Read the metadata record of a document.
    async fn get_latest(&self, key: &DocumentKey) -> AppResult<Option<DocumentMetadata>>;

    /// All version records of a document, ascending by version.
    async fn list_versions(&self, key: &DocumentKey) -> AppResult<Vec<DocumentVersion>>;

    /// A single version record.
    async fn get_version(
        &self,
        key: &DocumentKey,
        version: i64,
    ) -> AppResult<Option<DocumentVersion>>;

    /// Keys of every document of a tenant, sorted.
    async fn list_documents(&self, tenant_id: &str) -> AppResult<Vec<DocumentKey>>;

    /// Insert a new metadata record, and optionally its first version, atomically.
    async fn create_document(
        &self,
        metadata: &DocumentMetadata,
        initial: Option<&DocumentVersion>,
    ) -> AppResult<()>;

    /// Apply a [`VersionCommit`] atomically.
    async fn commit_version(&self, commit: &VersionCommit) -> AppResult<()>;

    /// Delete a document and all of its version records. Returns `true` if
    /// the document existed.
    async fn delete_document(&self, key: &DocumentKey) -> AppResult<bool>;
}
