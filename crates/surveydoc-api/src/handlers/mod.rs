//! HTTP handlers.

pub mod document;
pub mod health;
