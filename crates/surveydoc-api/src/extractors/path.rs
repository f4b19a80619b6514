//! Typed path parameters that resolve to document keys.

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;

use surveydoc_core::error::AppError;
use surveydoc_entity::document::DocumentKey;

use crate::error::ApiError;
use crate::state::AppState;

/// `/documents/{tenant}/{document}`
#[derive(Debug, Clone)]
pub struct DocumentPath(pub DocumentKey);

/// `/documents/{tenant}/{document}/versions/{version}`
#[derive(Debug, Clone)]
pub struct VersionPath(pub DocumentKey, pub i64);

impl FromRequestParts<AppState> for DocumentPath {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Path((tenant, document)) =
            Path::<(String, String)>::from_request_parts(parts, state)
                .await
                .map_err(|e| AppError::validation(e.body_text()))?;
        Ok(Self(DocumentKey::new(tenant, document)?))
    }
}

impl FromRequestParts<AppState> for VersionPath {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Path((tenant, document, version)) =
            Path::<(String, String, i64)>::from_request_parts(parts, state)
                .await
                .map_err(|e| AppError::validation(e.body_text()))?;
        if version < 1 {
            return Err(AppError::validation("version must be positive").into());
        }
        Ok(Self(DocumentKey::new(tenant, document)?, version))
    }
}
