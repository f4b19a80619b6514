//! Document metadata entity (the `#LATEST` record).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::key::{DocumentKey, RecordType, SortKey};

/// Current state of one document.
///
/// Created once at document creation and afterwards mutated only by the
/// versioning transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// Composite key of the document.
    pub document_key: DocumentKey,
    /// Always [`SortKey::Latest`].
    pub sort_key: SortKey,
    /// Always [`RecordType::Document`].
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// Owning tenant (duplicated from the key for querying).
    pub tenant_id: String,
    /// Version number of the most recently committed version, `0` if none.
    #[serde(default)]
    pub current_version: i64,
    /// When the content last changed.
    pub last_modified: DateTime<Utc>,
    /// When the record was last written.
    pub updated_at: DateTime<Utc>,
    /// When the document was created.
    pub created_at: DateTime<Utc>,
    /// MIME type of the content.
    pub file_type: String,
    /// Display file name.
    pub file_name: String,
    /// Size of the current content in bytes.
    pub size: i64,
    /// Actors allowed to edit.
    #[serde(default)]
    pub editors: Vec<String>,
    /// Actors allowed to read.
    #[serde(default)]
    pub viewers: Vec<String>,
    /// Creating actor.
    pub owner: String,
}

/// Attributes supplied when creating a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDocument {
    /// Display file name.
    pub file_name: String,
    /// MIME type; the configured default is used when absent.
    #[serde(default)]
    pub file_type: Option<String>,
    /// Actors allowed to edit besides the owner.
    #[serde(default)]
    pub editors: Vec<String>,
    /// Actors allowed to read.
    #[serde(default)]
    pub viewers: Vec<String>,
}

impl DocumentMetadata {
    /// Build the metadata record of a brand-new document, at version 0.
    pub fn new(
        key: DocumentKey,
        new: NewDocument,
        file_type: String,
        owner: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            tenant_id: key.tenant_id.clone(),
            document_key: key,
            sort_key: SortKey::Latest,
            record_type: RecordType::Document,
            current_version: 0,
            last_modified: now,
            updated_at: now,
            created_at: now,
            file_type,
            file_name: new.file_name,
            size: 0,
            editors: new.editors,
            viewers: new.viewers,
            owner: owner.into(),
        }
    }

    /// Owner or listed editor.
    pub fn can_edit(&self, actor: &str) -> bool {
        self.owner == actor || self.editors.iter().any(|e| e == actor)
    }

    /// Anyone who may edit, plus listed viewers.
    pub fn can_read(&self, actor: &str) -> bool {
        self.can_edit(actor) || self.viewers.iter().any(|v| v == actor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DocumentMetadata {
        DocumentMetadata::new(
            DocumentKey::new("acme", "d1").unwrap(),
            NewDocument {
                file_name: "roof.html".into(),
                file_type: None,
                editors: vec!["bob".into()],
                viewers: vec!["carol".into()],
            },
            "text/html".into(),
            "alice",
            Utc::now(),
        )
    }

    #[test]
    fn test_new_document_starts_at_version_zero() {
        let meta = sample();
        assert_eq!(meta.current_version, 0);
        assert_eq!(meta.sort_key, SortKey::Latest);
        assert_eq!(meta.tenant_id, "acme");
    }

    #[test]
    fn test_access_rules() {
        let meta = sample();
        assert!(meta.can_edit("alice"));
        assert!(meta.can_edit("bob"));
        assert!(!meta.can_edit("carol"));
        assert!(meta.can_read("carol"));
        assert!(!meta.can_read("mallory"));
    }

    #[test]
    fn test_logical_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["documentKey"], "acme#d1");
        assert_eq!(json["sortKey"], "#LATEST");
        assert_eq!(json["type"], "Document");
        assert_eq!(json["currentVersion"], 0);
        assert_eq!(json["tenantId"], "acme");
        assert!(json.get("lastModified").is_some());
    }

    #[test]
    fn test_missing_version_deserializes_as_zero() {
        let mut json = serde_json::to_value(sample()).unwrap();
        json.as_object_mut().unwrap().remove("currentVersion");
        let meta: DocumentMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(meta.current_version, 0);
    }
}
