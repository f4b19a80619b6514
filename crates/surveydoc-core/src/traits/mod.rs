//! Core traits defined in `surveydoc-core` and implemented by other crates.

pub mod storage;

pub use storage::{BlobMeta, BlobStore};
