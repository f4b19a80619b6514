//! Custom Axum extractors.

pub mod actor;
pub mod path;

pub use actor::Actor;
pub use path::{DocumentPath, VersionPath};
