//! Failure modes of the versioning protocol.

use thiserror::Error;

use surveydoc_core::error::{AppError, ErrorKind};

/// Error returned by [`VersioningService`](super::VersioningService).
///
/// Every variant leaves the document's records unchanged, except
/// `ReadBackFailed`, which is raised after a successful commit.
#[derive(Debug, Error)]
pub enum VersioningError {
    /// The document has no metadata record.
    #[error("Document {key} not found")]
    NotFound {
        /// Document key in string form.
        key: String,
    },

    /// Reading the records the update is based on failed.
    #[error("Failed to read document records: {0}")]
    ReadFailed(#[source] AppError),

    /// Writing the content blob failed; nothing was committed.
    #[error("Failed to upload content to {path}: {source}")]
    UploadFailed {
        /// Derived blob path.
        path: String,
        /// Underlying storage error.
        #[source]
        source: AppError,
    },

    /// Another writer advanced the document first. Re-read and retry.
    #[error("Document was updated concurrently (expected version {expected})")]
    VersionConflict {
        /// Version the failed attempt was based on.
        expected: i64,
    },

    /// The atomic write failed for a reason other than the version check.
    #[error("Version transaction failed: {0}")]
    TransactionFailed(#[source] AppError),

    /// The commit succeeded but the metadata could not be read back.
    #[error("Document {key} could not be read back after commit")]
    ReadBackFailed {
        /// Document key in string form.
        key: String,
        /// Underlying store error, if the read itself failed.
        #[source]
        source: Option<AppError>,
    },
}

impl VersioningError {
    /// Whether re-running the protocol with fresh state may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }
}

impl From<VersioningError> for AppError {
    fn from(err: VersioningError) -> Self {
        let kind = match &err {
            VersioningError::NotFound { .. } => ErrorKind::NotFound,
            VersioningError::VersionConflict { .. } => ErrorKind::Conflict,
            VersioningError::UploadFailed { .. } => ErrorKind::Storage,
            VersioningError::ReadFailed(_)
            | VersioningError::TransactionFailed(_)
            | VersioningError::ReadBackFailed { .. } => ErrorKind::Database,
        };
        let message = err.to_string();
        AppError::with_source(kind, message, err)
    }
}
