//! Optimistic single-document versioning.
//!
//! An update runs as: read the metadata record, upload the new content to
//! its version-derived blob path, commit the new version record together
//! with the metadata bump and retention pruning in one conditional
//! transaction, then read the metadata back.
//!
//! Blob uploads are create-only. Two writers racing for the same version
//! number cannot both publish content: the second upload fails and is
//! reported as a [`VersioningError::VersionConflict`], the same as losing
//! the transaction's version check.
//!
//! A failed attempt can leave its blob behind without a record pointing at
//! it. When an upload finds such a blob and the metadata still reads the
//! expected version, the blob is replaced once it is older than
//! `orphan_reclaim_seconds`; before that it still counts as a conflict.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use surveydoc_core::config::versioning::VersioningConfig;
use surveydoc_core::error::ErrorKind;
use surveydoc_core::result::AppResult;
use surveydoc_core::traits::storage::BlobStore;
use surveydoc_database::store::{DocumentStore, VersionCommit};
use surveydoc_entity::document::version::DEFAULT_CHANGE_TYPE;
use surveydoc_entity::document::{DocumentKey, DocumentMetadata, DocumentVersion};

use super::error::VersioningError;
use crate::context::RequestContext;

/// New content for a document.
#[derive(Debug, Clone)]
pub struct DocumentUpdate {
    /// Full document content.
    pub content: Bytes,
    /// Label stored on the version record; defaults to `"update"`.
    pub change_type: Option<String>,
}

impl DocumentUpdate {
    /// An update with the default change type.
    pub fn new(content: impl Into<Bytes>) -> Self {
        Self {
            content: content.into(),
            change_type: None,
        }
    }

    /// Sets the change type label.
    pub fn with_change_type(mut self, change_type: impl Into<String>) -> Self {
        self.change_type = Some(change_type.into());
        self
    }

    fn change_type(&self) -> &str {
        self.change_type
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CHANGE_TYPE)
    }
}

/// Applies content updates to documents under optimistic concurrency.
#[derive(Debug, Clone)]
pub struct VersioningService {
    /// Record store holding metadata and version records.
    documents: Arc<dyn DocumentStore>,
    /// Blob store holding version content.
    blobs: Arc<dyn BlobStore>,
    /// Retention and retry settings.
    config: VersioningConfig,
    /// File type assumed for documents whose metadata carries none.
    default_file_type: String,
}

impl VersioningService {
    /// Creates a new versioning service.
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        config: VersioningConfig,
        default_file_type: impl Into<String>,
    ) -> Self {
        Self {
            documents,
            blobs,
            config,
            default_file_type: default_file_type.into(),
        }
    }

    /// Retention and retry settings in effect.
    pub fn config(&self) -> &VersioningConfig {
        &self.config
    }

    /// Write `update` as the next version of `key`.
    ///
    /// Returns the metadata record as read back after the commit. On
    /// `VersionConflict` nothing was committed and the caller should re-read
    /// and decide whether to retry.
    pub async fn apply_update(
        &self,
        ctx: &RequestContext,
        key: &DocumentKey,
        update: &DocumentUpdate,
    ) -> Result<DocumentMetadata, VersioningError> {
        let metadata = self
            .documents
            .get_latest(key)
            .await
            .map_err(VersioningError::ReadFailed)?
            .ok_or_else(|| VersioningError::NotFound {
                key: key.to_string(),
            })?;

        let expected = metadata.current_version;
        let next = expected + 1;
        let file_type = if metadata.file_type.is_empty() {
            self.default_file_type.clone()
        } else {
            metadata.file_type.clone()
        };
        let committed_at = Utc::now();
        let record = DocumentVersion::new(
            key.clone(),
            next,
            ctx.actor_id.as_str(),
            update.change_type(),
            update.content.len() as i64,
            file_type.as_str(),
            metadata.file_name.as_str(),
            committed_at,
        );

        if let Err(e) = self
            .blobs
            .put(&record.path, update.content.clone(), &file_type)
            .await
        {
            if !e.is(ErrorKind::Conflict) {
                return Err(VersioningError::UploadFailed {
                    path: record.path.clone(),
                    source: e,
                });
            }
            self.reclaim_next_path(key, expected, &record.path, &update.content, &file_type)
                .await?;
        }

        let existing = match self.documents.list_versions(key).await {
            Ok(existing) => existing,
            Err(e) => {
                self.discard_blob(key, &record.path).await;
                return Err(VersioningError::ReadFailed(e));
            }
        };
        let prune = select_prune_set(&existing, self.config.max_versions);

        let commit = VersionCommit {
            key: key.clone(),
            expected_version: expected,
            version: record,
            prune,
            committed_at,
        };
        if let Err(e) = self.documents.commit_version(&commit).await {
            return Err(match e.kind {
                ErrorKind::Conflict => {
                    self.discard_blob(key, &commit.version.path).await;
                    VersioningError::VersionConflict { expected }
                }
                ErrorKind::NotFound => {
                    self.discard_blob(key, &commit.version.path).await;
                    VersioningError::NotFound {
                        key: key.to_string(),
                    }
                }
                // Outcome unknown: the blob goes only if the version did not move.
                _ => {
                    if self.version_unchanged(key, expected).await {
                        self.discard_blob(key, &commit.version.path).await;
                    }
                    VersioningError::TransactionFailed(e)
                }
            });
        }

        info!(
            document = %key,
            actor = %ctx.actor_id,
            version = next,
            change_type = %commit.version.change_type,
            bytes = commit.version.file_size,
            pruned = ?commit.prune,
            "Committed document version"
        );

        match self.documents.get_latest(key).await {
            Ok(Some(latest)) => Ok(latest),
            Ok(None) => Err(VersioningError::ReadBackFailed {
                key: key.to_string(),
                source: None,
            }),
            Err(e) => Err(VersioningError::ReadBackFailed {
                key: key.to_string(),
                source: Some(e),
            }),
        }
    }

    /// [`apply_update`](Self::apply_update), re-run on version conflicts
    /// with exponential backoff up to `retry.max_attempts` attempts.
    pub async fn apply_update_with_retry(
        &self,
        ctx: &RequestContext,
        key: &DocumentKey,
        update: &DocumentUpdate,
    ) -> Result<DocumentMetadata, VersioningError> {
        let retry = &self.config.retry;
        let mut attempt = 1;
        loop {
            match self.apply_update(ctx, key, update).await {
                Err(err) if err.is_retryable() && attempt < retry.max_attempts => {
                    let delay = retry.delay_for(attempt);
                    warn!(
                        document = %key,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Version conflict, retrying update"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Replaces the blob at `path` if it is older than the reclaim window.
    ///
    /// Callers must have checked that no record references `path`. Returns
    /// `Ok(false)` and leaves the blob alone while it is still recent, since
    /// its writer may be about to commit.
    pub(crate) async fn replace_stale_blob(
        &self,
        path: &str,
        data: Bytes,
        file_type: &str,
    ) -> AppResult<bool> {
        let window = i64::try_from(self.config.orphan_reclaim_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        let Some(cutoff) = Utc::now().checked_sub_signed(window) else {
            return Ok(false);
        };
        let written = self
            .blobs
            .list(path)
            .await?
            .into_iter()
            .find(|blob| blob.path == path)
            .and_then(|blob| blob.last_modified);
        match written {
            Some(at) if at <= cutoff => {}
            _ => return Ok(false),
        }

        warn!(path, written_at = ?written, "Replacing unreferenced blob");
        self.blobs.delete(path).await?;
        self.blobs.put(path, data, file_type).await?;
        Ok(true)
    }

    /// Handles an occupied blob path for version `expected + 1`. The path is
    /// taken over only when the version has not moved, no record claims it,
    /// and the blob is stale; anything else is a conflict.
    async fn reclaim_next_path(
        &self,
        key: &DocumentKey,
        expected: i64,
        path: &str,
        data: &Bytes,
        file_type: &str,
    ) -> Result<(), VersioningError> {
        let next = expected + 1;
        let unclaimed = self.version_unchanged(key, expected).await
            && matches!(self.documents.get_version(key, next).await, Ok(None));
        if !unclaimed {
            debug!(document = %key, version = next, "Blob for next version already claimed");
            return Err(VersioningError::VersionConflict { expected });
        }

        match self.replace_stale_blob(path, data.clone(), file_type).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                debug!(document = %key, version = next, "Unreferenced blob for next version is recent");
                Err(VersioningError::VersionConflict { expected })
            }
            Err(e) if e.is(ErrorKind::Conflict) => Err(VersioningError::VersionConflict { expected }),
            Err(e) => Err(VersioningError::UploadFailed {
                path: path.to_string(),
                source: e,
            }),
        }
    }

    /// Whether the metadata record still reads `expected`. Read failures
    /// count as "moved".
    async fn version_unchanged(&self, key: &DocumentKey, expected: i64) -> bool {
        matches!(
            self.documents.get_latest(key).await,
            Ok(Some(metadata)) if metadata.current_version == expected
        )
    }

    async fn discard_blob(&self, key: &DocumentKey, path: &str) {
        if let Err(e) = self.blobs.delete(path).await {
            warn!(document = %key, path, error = %e, "Failed to discard uncommitted blob");
        }
    }
}

/// Versions to delete so that, after adding one, at most `max_versions`
/// remain. Always the oldest; never more than needed.
pub fn select_prune_set(existing: &[DocumentVersion], max_versions: usize) -> Vec<i64> {
    let keep = max_versions.saturating_sub(1);
    if existing.len() <= keep {
        return Vec::new();
    }

    let mut versions: Vec<i64> = existing.iter().map(|v| v.version).collect();
    versions.sort_unstable();
    versions.truncate(existing.len() - keep);
    versions
}
