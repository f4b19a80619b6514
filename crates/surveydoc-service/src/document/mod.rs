//! Document services: the versioning protocol and the document lifecycle.

pub mod error;
pub mod service;
pub mod versioning;

pub use error::VersioningError;
pub use service::{CreateDocument, DocumentContent, DocumentService};
pub use versioning::{DocumentUpdate, VersioningService, select_prune_set};
