//! Document version entity (the `v<N>` records) and blob path derivation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::key::{DocumentKey, RecordType, SortKey};

/// MIME type whose content is stored with a `.json` extension.
pub const JSON_FILE_TYPE: &str = "application/json";

/// Change type used when the caller does not supply one.
pub const DEFAULT_CHANGE_TYPE: &str = "update";

/// Change type of the first version written at creation.
pub const CREATE_CHANGE_TYPE: &str = "create";

/// Change type of a version that re-publishes older content.
pub const RESTORE_CHANGE_TYPE: &str = "restore";

/// One immutable historical snapshot of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentVersion {
    /// Composite key of the document.
    pub document_key: DocumentKey,
    /// Always [`SortKey::Version`] of `version`.
    pub sort_key: SortKey,
    /// Always [`RecordType::Version`].
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// Sequential version number, starting at 1.
    pub version: i64,
    /// Actor who wrote this version.
    pub author: String,
    /// When this version was committed.
    pub created_at: DateTime<Utc>,
    /// Free-form label of the change ("update", "restore", ...).
    pub change_type: String,
    /// Blob path holding the content.
    pub path: String,
    /// Content size in bytes.
    pub file_size: i64,
    /// MIME type of the content.
    pub file_type: String,
    /// Display file name at the time of the change.
    pub file_name: String,
}

impl DocumentVersion {
    /// Build a version record whose blob path follows [`blob_path`].
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        key: DocumentKey,
        version: i64,
        author: impl Into<String>,
        change_type: impl Into<String>,
        file_size: i64,
        file_type: impl Into<String>,
        file_name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let file_type = file_type.into();
        Self {
            path: blob_path(&key, version, &file_type),
            document_key: key,
            sort_key: SortKey::Version(version),
            record_type: RecordType::Version,
            version,
            author: author.into(),
            created_at,
            change_type: change_type.into(),
            file_size,
            file_type,
            file_name: file_name.into(),
        }
    }
}

/// Extension of a content blob for the given MIME type.
pub fn extension_for(file_type: &str) -> &'static str {
    if file_type == JSON_FILE_TYPE {
        ".json"
    } else {
        ".html"
    }
}

/// Blob path of a version: `documents/<tenant>/<document>/v<version><ext>`.
pub fn blob_path(key: &DocumentKey, version: i64, file_type: &str) -> String {
    format!(
        "{}v{}{}",
        key.blob_prefix(),
        version,
        extension_for(file_type)
    )
}

/// Recover the version number from a path produced by [`blob_path`].
pub fn parse_blob_version(key: &DocumentKey, path: &str) -> Option<i64> {
    let name = path.strip_prefix(&key.blob_prefix())?;
    let stem = name
        .strip_suffix(".json")
        .or_else(|| name.strip_suffix(".html"))?;
    stem.strip_prefix('v')?.parse().ok().filter(|v| *v > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> DocumentKey {
        DocumentKey::new("acme", "d1").unwrap()
    }

    #[test]
    fn test_path_is_deterministic() {
        assert_eq!(
            blob_path(&key(), 4, "text/html"),
            "documents/acme/d1/v4.html"
        );
        assert_eq!(
            blob_path(&key(), 4, "text/html"),
            blob_path(&key(), 4, "text/html")
        );
    }

    #[test]
    fn test_json_extension_only_for_json() {
        assert_eq!(blob_path(&key(), 2, JSON_FILE_TYPE), "documents/acme/d1/v2.json");
        assert_eq!(extension_for("application/json; charset=utf-8"), ".html");
        assert_eq!(extension_for("text/plain"), ".html");
    }

    #[test]
    fn test_parse_blob_version() {
        let k = key();
        assert_eq!(parse_blob_version(&k, "documents/acme/d1/v7.json"), Some(7));
        assert_eq!(parse_blob_version(&k, "documents/acme/d1/v12.html"), Some(12));
        assert_eq!(parse_blob_version(&k, "documents/acme/d2/v1.html"), None);
        assert_eq!(parse_blob_version(&k, "documents/acme/d1/notes.txt"), None);
    }

    #[test]
    fn test_version_logical_shape() {
        let v = DocumentVersion::new(
            key(),
            3,
            "alice",
            DEFAULT_CHANGE_TYPE,
            42,
            "text/html",
            "roof.html",
            Utc::now(),
        );
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["sortKey"], "v3");
        assert_eq!(json["type"], "Version");
        assert_eq!(json["path"], "documents/acme/d1/v3.html");
        assert_eq!(json["changeType"], "update");
        assert_eq!(json["fileSize"], 42);
    }
}
