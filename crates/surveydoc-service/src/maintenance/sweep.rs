//! Reclaims content blobs that no version record references.
//!
//! Orphans come from pruned versions, from compensating deletes that
//! failed, from commits whose outcome was unknown, and from deleted
//! documents whose content could not be removed. A blob is removed
//! only when it is unreferenced and either belongs to a version at or
//! below the document's current version (so no in-flight writer can still
//! commit it) or is older than the grace period.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use surveydoc_core::error::AppError;
use surveydoc_core::traits::storage::BlobStore;
use surveydoc_database::store::DocumentStore;
use surveydoc_entity::document::DocumentKey;
use surveydoc_entity::document::version::parse_blob_version;

/// Outcome of a sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Blobs examined.
    pub scanned: usize,
    /// Blobs removed.
    pub deleted: usize,
    /// Blobs whose removal failed.
    pub failed: usize,
}

impl SweepReport {
    fn merge(&mut self, other: SweepReport) {
        self.scanned += other.scanned;
        self.deleted += other.deleted;
        self.failed += other.failed;
    }
}

/// Deletes unreferenced content blobs.
#[derive(Debug, Clone)]
pub struct BlobSweeper {
    documents: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    grace: Duration,
}

impl BlobSweeper {
    /// Creates a sweeper; blobs younger than `grace_seconds` above the
    /// current version are left alone.
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        grace_seconds: u64,
    ) -> Self {
        Self {
            documents,
            blobs,
            grace: i64::try_from(grace_seconds)
                .ok()
                .and_then(Duration::try_seconds)
                .unwrap_or(Duration::MAX),
        }
    }

    /// Sweeps every document of a tenant.
    pub async fn sweep_tenant(&self, tenant_id: &str) -> Result<SweepReport, AppError> {
        let mut keys: BTreeSet<DocumentKey> = self
            .documents
            .list_documents(tenant_id)
            .await?
            .into_iter()
            .collect();
        // Deleted documents have no records left but may still own blobs.
        let prefix = DocumentKey::tenant_blob_prefix(tenant_id);
        match self.blobs.list(&prefix).await {
            Ok(blobs) => keys.extend(blobs.iter().filter_map(|blob| {
                let (document_id, _) = blob.path.strip_prefix(&prefix)?.split_once('/')?;
                DocumentKey::new(tenant_id, document_id).ok()
            })),
            Err(e) => warn!(tenant = tenant_id, error = %e, "Failed to list tenant blobs"),
        }

        let mut report = SweepReport::default();
        for key in keys {
            match self.sweep_document(&key).await {
                Ok(r) => report.merge(r),
                Err(e) => warn!(document = %key, error = %e, "Sweep of document failed"),
            }
        }
        info!(
            tenant = tenant_id,
            scanned = report.scanned,
            deleted = report.deleted,
            failed = report.failed,
            "Tenant sweep finished"
        );
        Ok(report)
    }

    /// Sweeps one document.
    pub async fn sweep_document(&self, key: &DocumentKey) -> Result<SweepReport, AppError> {
        // Metadata is read before the version list: any version committed
        // in between is above `current` and therefore protected. Without
        // metadata nothing is referenced and only the grace period applies.
        let metadata = self.documents.get_latest(key).await?;
        let current = metadata.as_ref().map_or(0, |m| m.current_version);
        let blobs = self.blobs.list(&key.blob_prefix()).await?;
        let referenced: HashSet<String> = match metadata {
            Some(_) => self
                .documents
                .list_versions(key)
                .await?
                .into_iter()
                .map(|v| v.path)
                .collect(),
            None => HashSet::new(),
        };

        let cutoff = Utc::now().checked_sub_signed(self.grace);
        let mut report = SweepReport::default();
        for blob in blobs {
            report.scanned += 1;
            if referenced.contains(&blob.path) {
                continue;
            }
            let settled = parse_blob_version(key, &blob.path).is_some_and(|v| v <= current);
            let expired = blob
                .last_modified
                .zip(cutoff)
                .is_some_and(|(t, cutoff)| t < cutoff);
            if !settled && !expired {
                continue;
            }

            match self.blobs.delete(&blob.path).await {
                Ok(()) => {
                    debug!(document = %key, path = %blob.path, "Swept orphaned blob");
                    report.deleted += 1;
                }
                Err(e) => {
                    warn!(document = %key, path = %blob.path, error = %e, "Failed to sweep blob");
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }
}
