//! `[storage]` section: where version content blobs live.

use serde::{Deserialize, Serialize};

/// Blob store selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// `"local"`, `"s3"` or `"memory"`.
    pub provider: String,
    /// Content type of documents created without one. Decides the blob
    /// extension: `application/json` maps to `.json`, anything else to `.html`.
    pub default_file_type: String,
    /// Settings for the `local` provider.
    pub local: LocalStorageConfig,
    /// Settings for the `s3` provider.
    pub s3: S3StorageConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: "local".to_string(),
            default_file_type: "text/html".to_string(),
            local: LocalStorageConfig::default(),
            s3: S3StorageConfig::default(),
        }
    }
}

/// `[storage.local]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalStorageConfig {
    /// Directory holding the `documents/` tree.
    pub root_path: String,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            root_path: "./data/blobs".to_string(),
        }
    }
}

/// `[storage.s3]`
///
/// The bucket must support conditional writes (`If-None-Match`), which
/// versioned content relies on to never overwrite an existing blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct S3StorageConfig {
    /// Endpoint for S3-compatible services; empty means AWS.
    pub endpoint: String,
    /// Region name.
    pub region: String,
    /// Bucket holding document content.
    pub bucket: String,
    /// Static access key; empty uses the default credential chain.
    pub access_key: String,
    /// Static secret key.
    pub secret_key: String,
    /// Path-style addressing, needed by most self-hosted stores.
    pub force_path_style: bool,
}

impl Default for S3StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            region: "us-east-1".to_string(),
            bucket: String::new(),
            access_key: String::new(),
            secret_key: String::new(),
            force_path_style: false,
        }
    }
}
