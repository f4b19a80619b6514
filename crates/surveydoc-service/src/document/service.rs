//! Document lifecycle with access-list enforcement.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tracing::{info, warn};

use surveydoc_core::error::{AppError, ErrorKind};
use surveydoc_core::traits::storage::BlobStore;
use surveydoc_database::store::DocumentStore;
use surveydoc_entity::document::version::{CREATE_CHANGE_TYPE, RESTORE_CHANGE_TYPE};
use surveydoc_entity::document::{DocumentKey, DocumentMetadata, DocumentVersion, NewDocument};

use super::versioning::{DocumentUpdate, VersioningService};
use crate::context::RequestContext;

/// Data for creating a document.
#[derive(Debug, Clone, Default)]
pub struct CreateDocument {
    /// Name, type, and access lists.
    pub document: NewDocument,
    /// Optional initial content, stored as version 1.
    pub content: Option<Bytes>,
}

/// Content of one version together with its descriptive fields.
#[derive(Debug, Clone)]
pub struct DocumentContent {
    /// Version the content belongs to.
    pub version: i64,
    /// MIME type of the content.
    pub file_type: String,
    /// Display file name.
    pub file_name: String,
    /// Raw content.
    pub data: Bytes,
}

/// Handles document creation, reads, history, restore, and deletion.
#[derive(Debug, Clone)]
pub struct DocumentService {
    /// Record store.
    documents: Arc<dyn DocumentStore>,
    /// Blob store.
    blobs: Arc<dyn BlobStore>,
    /// Update protocol.
    versioning: Arc<VersioningService>,
    /// File type for documents created without one.
    default_file_type: String,
}

impl DocumentService {
    /// Creates a new document service.
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        versioning: Arc<VersioningService>,
        default_file_type: impl Into<String>,
    ) -> Self {
        Self {
            documents,
            blobs,
            versioning,
            default_file_type: default_file_type.into(),
        }
    }

    /// Creates a document owned by the acting user.
    pub async fn create_document(
        &self,
        ctx: &RequestContext,
        key: &DocumentKey,
        req: CreateDocument,
    ) -> Result<DocumentMetadata, AppError> {
        let CreateDocument { document, content } = req;
        if document.file_name.trim().is_empty() {
            return Err(AppError::validation("fileName must not be empty"));
        }

        let file_type = document
            .file_type
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| self.default_file_type.clone());
        let now = Utc::now();
        let mut metadata = DocumentMetadata::new(
            key.clone(),
            document,
            file_type.clone(),
            ctx.actor_id.as_str(),
            now,
        );

        let initial = match content {
            Some(data) => {
                let record = DocumentVersion::new(
                    key.clone(),
                    1,
                    ctx.actor_id.as_str(),
                    CREATE_CHANGE_TYPE,
                    data.len() as i64,
                    file_type.as_str(),
                    metadata.file_name.as_str(),
                    now,
                );
                if let Err(e) = self.blobs.put(&record.path, data.clone(), &file_type).await {
                    if !e.is(ErrorKind::Conflict) {
                        return Err(e);
                    }
                    self.reclaim_initial_blob(key, &record.path, data, &file_type)
                        .await?;
                }
                metadata.current_version = 1;
                metadata.size = record.file_size;
                Some(record)
            }
            None => None,
        };

        if let Err(e) = self
            .documents
            .create_document(&metadata, initial.as_ref())
            .await
        {
            if let Some(record) = &initial {
                // An unknown outcome may have created the document after all.
                let settled = e.is(ErrorKind::Conflict)
                    || matches!(self.documents.get_latest(key).await, Ok(None));
                if settled {
                    if let Err(cleanup) = self.blobs.delete(&record.path).await {
                        warn!(document = %key, error = %cleanup, "Failed to discard initial content");
                    }
                }
            }
            return Err(e);
        }

        info!(
            document = %key,
            owner = %ctx.actor_id,
            version = metadata.current_version,
            "Document created"
        );
        Ok(metadata)
    }

    /// Gets a document's metadata, enforcing read access.
    pub async fn get_document(
        &self,
        ctx: &RequestContext,
        key: &DocumentKey,
    ) -> Result<DocumentMetadata, AppError> {
        let metadata = self.load(key).await?;
        Self::require_read(ctx, &metadata)?;
        Ok(metadata)
    }

    /// Reads the content of `version`, or of the current version if `None`.
    pub async fn read_content(
        &self,
        ctx: &RequestContext,
        key: &DocumentKey,
        version: Option<i64>,
    ) -> Result<DocumentContent, AppError> {
        let metadata = self.load(key).await?;
        Self::require_read(ctx, &metadata)?;

        let version = version.unwrap_or(metadata.current_version);
        if version < 1 {
            return Err(AppError::not_found(format!("Document {key} has no content yet")));
        }
        let record = self
            .documents
            .get_version(key, version)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Version {version} of document {key} not found"))
            })?;
        let data = self.blobs.get(&record.path).await?;

        Ok(DocumentContent {
            version,
            file_type: record.file_type,
            file_name: record.file_name,
            data,
        })
    }

    /// Retained versions, newest first.
    pub async fn list_versions(
        &self,
        ctx: &RequestContext,
        key: &DocumentKey,
    ) -> Result<Vec<DocumentVersion>, AppError> {
        let metadata = self.load(key).await?;
        Self::require_read(ctx, &metadata)?;

        let mut versions = self.documents.list_versions(key).await?;
        versions.reverse();
        Ok(versions)
    }

    /// Writes new content as the next version, retrying on conflicts.
    pub async fn update_content(
        &self,
        ctx: &RequestContext,
        key: &DocumentKey,
        update: DocumentUpdate,
    ) -> Result<DocumentMetadata, AppError> {
        let metadata = self.load(key).await?;
        Self::require_edit(ctx, &metadata)?;

        Ok(self
            .versioning
            .apply_update_with_retry(ctx, key, &update)
            .await?)
    }

    /// Writes the content of an older version as a new version.
    pub async fn restore_version(
        &self,
        ctx: &RequestContext,
        key: &DocumentKey,
        version: i64,
    ) -> Result<DocumentMetadata, AppError> {
        let metadata = self.load(key).await?;
        Self::require_edit(ctx, &metadata)?;

        let content = self.read_content(ctx, key, Some(version)).await?;
        let update = DocumentUpdate::new(content.data).with_change_type(RESTORE_CHANGE_TYPE);
        let restored = self
            .versioning
            .apply_update_with_retry(ctx, key, &update)
            .await?;

        info!(
            document = %key,
            from_version = version,
            version = restored.current_version,
            "Document version restored"
        );
        Ok(restored)
    }

    /// Deletes a document, its records, and its content. Owner only.
    pub async fn delete_document(
        &self,
        ctx: &RequestContext,
        key: &DocumentKey,
    ) -> Result<(), AppError> {
        let metadata = self.load(key).await?;
        if !ctx.is_system && metadata.owner != ctx.actor_id {
            return Err(AppError::authorization(
                "Only the owner can delete a document",
            ));
        }

        if !self.documents.delete_document(key).await? {
            return Err(AppError::not_found(format!("Document {key} not found")));
        }

        let blobs = match self.blobs.list(&key.blob_prefix()).await {
            Ok(blobs) => blobs,
            Err(e) => {
                warn!(document = %key, error = %e, "Failed to list blobs; leaving them to the sweeper");
                Vec::new()
            }
        };
        let mut removed = 0usize;
        for blob in blobs {
            match self.blobs.delete(&blob.path).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(document = %key, path = %blob.path, error = %e, "Failed to delete blob"),
            }
        }

        info!(document = %key, blobs = removed, "Document deleted");
        Ok(())
    }

    /// Takes over a `v1` blob left by an earlier create or a deleted
    /// document with the same key.
    async fn reclaim_initial_blob(
        &self,
        key: &DocumentKey,
        path: &str,
        data: Bytes,
        file_type: &str,
    ) -> Result<(), AppError> {
        let taken = || AppError::conflict(format!("Document {key} already has content"));
        if self.documents.get_latest(key).await?.is_some() {
            return Err(taken());
        }
        match self.versioning.replace_stale_blob(path, data, file_type).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(taken()),
            Err(e) if e.is(ErrorKind::Conflict) => Err(taken()),
            Err(e) => Err(e),
        }
    }

    async fn load(&self, key: &DocumentKey) -> Result<DocumentMetadata, AppError> {
        self.documents
            .get_latest(key)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Document {key} not found")))
    }

    fn require_read(ctx: &RequestContext, metadata: &DocumentMetadata) -> Result<(), AppError> {
        if ctx.is_system || metadata.can_read(&ctx.actor_id) {
            Ok(())
        } else {
            Err(AppError::authorization(format!(
                "{} may not read document {}",
                ctx.actor_id, metadata.document_key
            )))
        }
    }

    fn require_edit(ctx: &RequestContext, metadata: &DocumentMetadata) -> Result<(), AppError> {
        if ctx.is_system || metadata.can_edit(&ctx.actor_id) {
            Ok(())
        } else {
            Err(AppError::authorization(format!(
                "{} may not edit document {}",
                ctx.actor_id, metadata.document_key
            )))
        }
    }
}
