//! Request DTOs.

use serde::{Deserialize, Serialize};

use surveydoc_entity::document::NewDocument;
use surveydoc_service::{CreateDocument, DocumentUpdate};

/// Create document request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentRequest {
    /// Display file name.
    pub file_name: String,
    /// MIME type; the configured default when omitted.
    #[serde(default)]
    pub file_type: Option<String>,
    /// Actors allowed to edit.
    #[serde(default)]
    pub editors: Vec<String>,
    /// Actors allowed to read.
    #[serde(default)]
    pub viewers: Vec<String>,
    /// Initial content, stored as version 1.
    #[serde(default)]
    pub content: Option<String>,
}

impl From<CreateDocumentRequest> for CreateDocument {
    fn from(req: CreateDocumentRequest) -> Self {
        Self {
            document: NewDocument {
                file_name: req.file_name,
                file_type: req.file_type,
                editors: req.editors,
                viewers: req.viewers,
            },
            content: req.content.map(Into::into),
        }
    }
}

/// Update content request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContentRequest {
    /// Full new content.
    pub content: String,
    /// Change label, `"update"` when omitted.
    #[serde(default)]
    pub change_type: Option<String>,
}

impl From<UpdateContentRequest> for DocumentUpdate {
    fn from(req: UpdateContentRequest) -> Self {
        Self {
            content: req.content.into(),
            change_type: req.change_type,
        }
    }
}
