//! # surveydoc-service
//!
//! Business logic for SurveyDoc. The [`VersioningService`] implements the
//! optimistic single-document update protocol; [`DocumentService`] builds
//! the document lifecycle (create, read, history, restore, delete) on top
//! of it; [`BlobSweeper`] reclaims content blobs no record points to.
//!
//! Services follow constructor injection: the record store and blob store
//! are provided at construction time as `Arc<dyn ...>` handles.

pub mod context;
pub mod document;
pub mod maintenance;

pub use context::RequestContext;
pub use document::{
    CreateDocument, DocumentContent, DocumentService, DocumentUpdate, VersioningError,
    VersioningService,
};
pub use maintenance::{BlobSweeper, SweepReport};
