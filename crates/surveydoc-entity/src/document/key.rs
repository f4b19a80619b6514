//! Composite keys addressing records in the document store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use surveydoc_core::error::AppError;

/// Identifies one document within one tenant.
///
/// The string form is `<tenant_id>#<document_id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct DocumentKey {
    /// Owning tenant.
    pub tenant_id: String,
    /// Document identifier, unique within the tenant.
    pub document_id: String,
}

impl DocumentKey {
    /// Build a key, rejecting empty parts and the reserved `/` and `#`.
    pub fn new(
        tenant_id: impl Into<String>,
        document_id: impl Into<String>,
    ) -> Result<Self, AppError> {
        let tenant_id = tenant_id.into();
        let document_id = document_id.into();
        validate_part("tenant id", &tenant_id)?;
        validate_part("document id", &document_id)?;
        Ok(Self {
            tenant_id,
            document_id,
        })
    }

    /// Prefix shared by every content blob of this document.
    pub fn blob_prefix(&self) -> String {
        format!("{}{}/", Self::tenant_blob_prefix(&self.tenant_id), self.document_id)
    }

    /// Prefix shared by every content blob of a tenant.
    pub fn tenant_blob_prefix(tenant_id: &str) -> String {
        format!("documents/{tenant_id}/")
    }
}

fn validate_part(what: &str, value: &str) -> Result<(), AppError> {
    if value.is_empty() {
        return Err(AppError::validation(format!("{what} must not be empty")));
    }
    if value.contains(['/', '#']) || value.chars().any(char::is_control) {
        return Err(AppError::validation(format!(
            "{what} '{value}' contains a reserved character"
        )));
    }
    Ok(())
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.tenant_id, self.document_id)
    }
}

impl FromStr for DocumentKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (tenant, document) = s
            .split_once('#')
            .ok_or_else(|| AppError::validation(format!("Invalid document key '{s}'")))?;
        Self::new(tenant, document)
    }
}

impl From<DocumentKey> for String {
    fn from(key: DocumentKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for DocumentKey {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Sort key within a document's partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum SortKey {
    /// The single metadata record, `#LATEST`.
    Latest,
    /// A version record, `v<N>`.
    Version(i64),
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => write!(f, "#LATEST"),
            Self::Version(n) => write!(f, "v{n}"),
        }
    }
}

impl FromStr for SortKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "#LATEST" {
            return Ok(Self::Latest);
        }
        s.strip_prefix('v')
            .and_then(|n| n.parse::<i64>().ok())
            .filter(|n| *n > 0)
            .map(Self::Version)
            .ok_or_else(|| AppError::validation(format!("Invalid sort key '{s}'")))
    }
}

impl From<SortKey> for String {
    fn from(key: SortKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for SortKey {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Discriminator stored in the `type` attribute of every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// Metadata record.
    Document,
    /// Version record.
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_round_trips_through_string() {
        let key = DocumentKey::new("acme", "survey-17").unwrap();
        assert_eq!(key.to_string(), "acme#survey-17");
        assert_eq!("acme#survey-17".parse::<DocumentKey>().unwrap(), key);
        assert_eq!(key.blob_prefix(), "documents/acme/survey-17/");
    }

    #[test]
    fn test_key_rejects_reserved_characters() {
        assert!(DocumentKey::new("", "doc").is_err());
        assert!(DocumentKey::new("acme", "a/b").is_err());
        assert!(DocumentKey::new("ac#me", "doc").is_err());
        assert!("no-separator".parse::<DocumentKey>().is_err());
    }

    #[test]
    fn test_sort_keys() {
        assert_eq!(SortKey::Latest.to_string(), "#LATEST");
        assert_eq!(SortKey::Version(12).to_string(), "v12");
        assert_eq!("v3".parse::<SortKey>().unwrap(), SortKey::Version(3));
        assert!("v0".parse::<SortKey>().is_err());
        assert!("x3".parse::<SortKey>().is_err());
    }

    #[test]
    fn test_key_serializes_as_string() {
        let key = DocumentKey::new("acme", "d1").unwrap();
        assert_eq!(serde_json::to_value(&key).unwrap(), serde_json::json!("acme#d1"));
        let back: DocumentKey = serde_json::from_value(serde_json::json!("acme#d1")).unwrap();
        assert_eq!(back, key);
    }
}
