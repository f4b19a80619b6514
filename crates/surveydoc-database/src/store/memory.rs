//! In-process document store.
//!
//! Every operation takes one lock over the whole map, which makes
//! [`DocumentStore::commit_version`] atomic with respect to all readers.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use surveydoc_core::error::AppError;
use surveydoc_core::result::AppResult;
use surveydoc_entity::document::{DocumentKey, DocumentMetadata, DocumentVersion};

use super::{DocumentStore, VersionCommit};

#[derive(Debug, Clone)]
struct StoredDocument {
    metadata: DocumentMetadata,
    versions: BTreeMap<i64, DocumentVersion>,
}

/// Document store kept in memory; used for tests and `memory://` setups.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    documents: Arc<RwLock<BTreeMap<DocumentKey, StoredDocument>>>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn backend(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn get_latest(&self, key: &DocumentKey) -> AppResult<Option<DocumentMetadata>> {
        let documents = self.documents.read().await;
        Ok(documents.get(key).map(|doc| doc.metadata.clone()))
    }

    async fn list_versions(&self, key: &DocumentKey) -> AppResult<Vec<DocumentVersion>> {
        let documents = self.documents.read().await;
        Ok(documents
            .get(key)
            .map(|doc| doc.versions.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn get_version(
        &self,
        key: &DocumentKey,
        version: i64,
    ) -> AppResult<Option<DocumentVersion>> {
        let documents = self.documents.read().await;
        Ok(documents
            .get(key)
            .and_then(|doc| doc.versions.get(&version).cloned()))
    }

    async fn list_documents(&self, tenant_id: &str) -> AppResult<Vec<DocumentKey>> {
        let documents = self.documents.read().await;
        Ok(documents
            .keys()
            .filter(|key| key.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn create_document(
        &self,
        metadata: &DocumentMetadata,
        initial: Option<&DocumentVersion>,
    ) -> AppResult<()> {
        let mut documents = self.documents.write().await;
        if documents.contains_key(&metadata.document_key) {
            return Err(AppError::conflict(format!(
                "Document {} already exists",
                metadata.document_key
            )));
        }

        let versions = initial
            .map(|v| (v.version, v.clone()))
            .into_iter()
            .collect();
        documents.insert(
            metadata.document_key.clone(),
            StoredDocument {
                metadata: metadata.clone(),
                versions,
            },
        );
        Ok(())
    }

    async fn commit_version(&self, commit: &VersionCommit) -> AppResult<()> {
        let key = &commit.key;
        let mut documents = self.documents.write().await;
        let doc = documents
            .get_mut(key)
            .ok_or_else(|| AppError::not_found(format!("Document {key} not found")))?;

        let actual = doc.metadata.current_version;
        if actual != commit.expected_version {
            return Err(AppError::conflict(format!(
                "Document {key} is at version {actual}, expected {}",
                commit.expected_version
            )));
        }
        if doc.versions.contains_key(&commit.version.version) {
            return Err(AppError::conflict(format!(
                "Version {} of {key} already exists",
                commit.version.version
            )));
        }

        // All checks passed; nothing below can fail.
        doc.metadata.current_version = commit.version.version;
        doc.metadata.last_modified = commit.committed_at;
        doc.metadata.updated_at = commit.committed_at;
        doc.metadata.size = commit.version.file_size;
        doc.versions
            .insert(commit.version.version, commit.version.clone());
        for version in &commit.prune {
            doc.versions.remove(version);
        }
        Ok(())
    }

    async fn delete_document(&self, key: &DocumentKey) -> AppResult<bool> {
        let mut documents = self.documents.write().await;
        Ok(documents.remove(key).is_some())
    }
}
