//! Document domain entities.

pub mod key;
pub mod metadata;
pub mod version;

pub use key::{DocumentKey, RecordType, SortKey};
pub use metadata::{DocumentMetadata, NewDocument};
pub use version::DocumentVersion;
