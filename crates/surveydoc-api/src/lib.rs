//! # surveydoc-api
//!
//! HTTP API layer for SurveyDoc built on Axum.
//!
//! Provides the document REST endpoints, middleware (CORS, request logging,
//! compression, timeouts), the actor extractor, DTOs, and error mapping.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
