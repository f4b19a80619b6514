//! # surveydoc-entity
//!
//! Record types for SurveyDoc. Every struct in this crate represents an
//! item of the record store (the `#LATEST` metadata record or a `v<N>`
//! version record) or a value object used to address one. All records
//! serialize to the camelCase logical shapes exposed over the API.

pub mod document;

pub use document::{
    DocumentKey, DocumentMetadata, DocumentVersion, NewDocument, RecordType, SortKey,
};
