//! S3-compatible object storage (requires the `s3` feature).

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::{debug, info};

use surveydoc_core::config::storage::S3StorageConfig;
use surveydoc_core::error::{AppError, ErrorKind};
use surveydoc_core::result::AppResult;
use surveydoc_core::traits::storage::{BlobMeta, BlobStore};

/// S3-compatible blob store.
///
/// Create-only writes rely on conditional `PutObject` (`If-None-Match: *`).
#[derive(Debug, Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    /// Create a new S3 blob store from configuration.
    pub async fn new(config: &S3StorageConfig) -> AppResult<Self> {
        info!(
            endpoint = %config.endpoint,
            region = %config.region,
            bucket = %config.bucket,
            "Initializing S3 blob store"
        );

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));
        if !config.access_key.is_empty() {
            loader = loader.credentials_provider(Credentials::new(
                config.access_key.clone(),
                config.secret_key.clone(),
                None,
                None,
                "surveydoc-config",
            ));
        }
        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.force_path_style);
        if !config.endpoint.is_empty() {
            builder = builder.endpoint_url(config.endpoint.clone());
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
        })
    }
}

/// HTTP status of a failed S3 call, if a response was received.
fn status_of<E>(err: &SdkError<E, HttpResponse>) -> Option<u16> {
    err.raw_response().map(|r| r.status().as_u16())
}

fn storage_error<E>(message: String, err: E) -> AppError
where
    E: std::error::Error + Send + Sync + 'static,
{
    AppError::with_source(ErrorKind::Storage, message, err)
}

#[async_trait]
impl BlobStore for S3BlobStore {
    fn provider_type(&self) -> &str {
        "s3"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(self
            .client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok())
    }

    async fn put(&self, path: &str, data: Bytes, content_type: &str) -> AppResult<()> {
        let size = data.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .content_type(content_type)
            .if_none_match("*")
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| match status_of(&e) {
                // 412: object exists; 409: a concurrent conditional write won.
                Some(412) | Some(409) => AppError::conflict(format!("Blob already exists: {path}")),
                _ => storage_error(format!("Failed to upload blob: {path}"), e),
            })?;

        debug!(path, bytes = size, content_type, "Uploaded blob");
        Ok(())
    }

    async fn get(&self, path: &str) -> AppResult<Bytes> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|s| s.is_no_such_key()) {
                    AppError::not_found(format!("Blob not found: {path}"))
                } else {
                    storage_error(format!("Failed to download blob: {path}"), e)
                }
            })?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| storage_error(format!("Failed to read blob body: {path}"), e))?;
        Ok(body.into_bytes())
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| storage_error(format!("Failed to delete blob: {path}"), e))?;
        Ok(())
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|s| s.is_not_found()) => Ok(false),
            Err(e) => Err(storage_error(format!("Failed to stat blob: {path}"), e)),
        }
    }

    async fn list(&self, prefix: &str) -> AppResult<Vec<BlobMeta>> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .into_paginator()
            .send();

        let mut entries = Vec::new();
        while let Some(page) = pages.next().await {
            let page =
                page.map_err(|e| storage_error(format!("Failed to list blobs: {prefix}"), e))?;
            for object in page.contents() {
                let Some(key) = object.key() else {
                    continue;
                };
                entries.push(BlobMeta {
                    path: key.to_string(),
                    size_bytes: object.size().unwrap_or(0).max(0) as u64,
                    content_type: None,
                    last_modified: object.last_modified().and_then(|t| {
                        chrono::DateTime::from_timestamp(t.secs(), t.subsec_nanos())
                    }),
                });
            }
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }
}
