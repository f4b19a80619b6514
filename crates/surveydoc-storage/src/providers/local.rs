//! Local filesystem blob store.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::{debug, info, warn};

use surveydoc_core::error::{AppError, ErrorKind};
use surveydoc_core::result::AppResult;
use surveydoc_core::traits::storage::{BlobMeta, BlobStore};

/// Name prefix of in-progress uploads; never listed.
const TEMP_PREFIX: &str = ".tmp-";

/// Temporary files older than this are left over from an interrupted
/// upload and removed when a store opens its root.
pub const STALE_TEMP_AGE: Duration = Duration::from_secs(3600);

/// Local filesystem blob store.
///
/// Writes land in a uniquely named temporary file next to the target and
/// are published with a no-clobber rename, which fails if the target
/// exists. A blob is therefore either absent or complete, and never
/// replaced.
#[derive(Debug)]
pub struct LocalBlobStore {
    /// Root directory for all stored blobs.
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create a new local blob store rooted at the given path.
    pub async fn new(root_path: &str) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;
        let store = Self { root };
        match store.purge_stale_temp_files(STALE_TEMP_AGE).await {
            Ok(0) => {}
            Ok(removed) => info!(removed, "Removed interrupted uploads"),
            Err(e) => warn!(error = %e, "Failed to clean up interrupted uploads"),
        }
        Ok(store)
    }

    /// Deletes temporary upload files older than `max_age`. Returns how
    /// many were removed.
    pub async fn purge_stale_temp_files(&self, max_age: Duration) -> AppResult<usize> {
        let cutoff = SystemTime::now().checked_sub(max_age);
        let mut removed = 0;
        for (path, meta) in self.files_under(self.root.clone()).await? {
            if !is_temp(&path) {
                continue;
            }
            let stale = match (meta.modified().ok(), cutoff) {
                (Some(modified), Some(cutoff)) => modified <= cutoff,
                _ => false,
            };
            if stale && fs::remove_file(&path).await.is_ok() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Every regular file below `start`, temporary ones included.
    async fn files_under(&self, start: PathBuf) -> AppResult<Vec<(PathBuf, std::fs::Metadata)>> {
        let mut files = Vec::new();
        let mut pending = vec![start];
        while let Some(dir) = pending.pop() {
            let mut reader = match fs::read_dir(&dir).await {
                Ok(reader) => reader,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(AppError::with_source(
                        ErrorKind::Storage,
                        format!("Failed to list directory: {}", dir.display()),
                        e,
                    ));
                }
            };

            while let Some(entry) = reader.next_entry().await.map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to read directory entry", e)
            })? {
                let meta = entry.metadata().await.map_err(|e| {
                    AppError::with_source(ErrorKind::Storage, "Failed to get entry metadata", e)
                })?;
                if meta.is_dir() {
                    pending.push(entry.path());
                } else {
                    files.push((entry.path(), meta));
                }
            }
        }
        Ok(files)
    }

    /// Resolve a relative path to an absolute path within the root.
    fn resolve(&self, path: &str) -> AppResult<PathBuf> {
        let clean = path.trim_start_matches('/');
        if clean.is_empty() || clean.split('/').any(|part| part == "..") {
            return Err(AppError::validation(format!("Invalid blob path: {path}")));
        }
        Ok(self.root.join(clean))
    }

    /// Ensure the parent directory of a path exists.
    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }

    /// Path of `full` relative to the root, `/`-separated.
    fn relative(&self, full: &Path) -> Option<String> {
        let rel = full.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false))
    }

    async fn put(&self, path: &str, data: Bytes, content_type: &str) -> AppResult<()> {
        let full_path = self.resolve(path)?;
        self.ensure_parent(&full_path).await?;

        let target = full_path.clone();
        let payload = data.clone();
        let written = tokio::task::spawn_blocking(move || write_new_file(&target, &payload))
            .await
            .map_err(|e| AppError::internal(format!("Upload task failed: {e}")))?;
        written.map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                AppError::conflict(format!("Blob already exists: {path}"))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to write file: {path}"),
                    e,
                )
            }
        })?;

        debug!(path, bytes = data.len(), content_type, "Wrote blob");
        Ok(())
    }

    async fn get(&self, path: &str) -> AppResult<Bytes> {
        let full_path = self.resolve(path)?;
        let data = fs::read(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Blob not found: {path}"))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to read file: {path}"),
                    e,
                )
            }
        })?;
        Ok(Bytes::from(data))
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        let full_path = self.resolve(path)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to delete file: {path}"),
                e,
            )),
        }
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        let full_path = self.resolve(path)?;
        Ok(fs::try_exists(&full_path).await.unwrap_or(false))
    }

    async fn list(&self, prefix: &str) -> AppResult<Vec<BlobMeta>> {
        let prefix = prefix.trim_start_matches('/');
        let start = match prefix.rfind('/') {
            Some(pos) => self.root.join(&prefix[..pos]),
            None => self.root.clone(),
        };

        let mut entries = Vec::new();
        for (full, meta) in self.files_under(start).await? {
            if is_temp(&full) {
                continue;
            }
            let Some(path) = self.relative(&full) else {
                continue;
            };
            if !path.starts_with(prefix) {
                continue;
            }
            entries.push(BlobMeta {
                content_type: mime_from_path(&path),
                size_bytes: meta.len(),
                last_modified: meta.modified().ok().map(chrono::DateTime::from),
                path,
            });
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }
}

/// Writes `data` to a fresh temporary file beside `target`, then moves it
/// into place unless `target` already exists. The temporary file is
/// removed on any failure.
fn write_new_file(target: &Path, data: &[u8]) -> std::io::Result<()> {
    let dir = target.parent().unwrap_or(Path::new("."));
    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .tempfile_in(dir)?;
    temp.write_all(data)?;
    temp.as_file().sync_all()?;
    temp.persist_noclobber(target).map_err(|e| e.error)?;
    Ok(())
}

fn is_temp(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with(TEMP_PREFIX))
}

/// Guess the MIME type of a content blob from its extension.
fn mime_from_path(path: &str) -> Option<String> {
    let ext = path.rsplit_once('.')?.1.to_lowercase();
    let mime = match ext.as_str() {
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "txt" => "text/plain",
        _ => return None,
    };
    Some(mime.to_string())
}
