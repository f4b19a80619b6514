//! Document, content, and version handlers.

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

use surveydoc_core::error::AppError;
use surveydoc_entity::document::{DocumentMetadata, DocumentVersion};
use surveydoc_service::DocumentContent;

use crate::dto::request::{CreateDocumentRequest, UpdateContentRequest};
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::{Actor, DocumentPath, VersionPath};
use crate::state::AppState;

/// Response header carrying the version of returned content.
pub const VERSION_HEADER: &str = "x-document-version";

/// POST /api/documents/{tenant}/{document}
pub async fn create_document(
    State(state): State<AppState>,
    actor: Actor,
    DocumentPath(key): DocumentPath,
    Json(req): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DocumentMetadata>>), ApiError> {
    let metadata = state
        .documents
        .create_document(&actor, &key, req.into())
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(metadata))))
}

/// GET /api/documents/{tenant}/{document}
pub async fn get_document(
    State(state): State<AppState>,
    actor: Actor,
    DocumentPath(key): DocumentPath,
) -> Result<Json<ApiResponse<DocumentMetadata>>, ApiError> {
    let metadata = state.documents.get_document(&actor, &key).await?;
    Ok(Json(ApiResponse::ok(metadata)))
}

/// DELETE /api/documents/{tenant}/{document}
pub async fn delete_document(
    State(state): State<AppState>,
    actor: Actor,
    DocumentPath(key): DocumentPath,
) -> Result<StatusCode, ApiError> {
    state.documents.delete_document(&actor, &key).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/documents/{tenant}/{document}/content
pub async fn get_content(
    State(state): State<AppState>,
    actor: Actor,
    DocumentPath(key): DocumentPath,
) -> Result<Response, ApiError> {
    let content = state.documents.read_content(&actor, &key, None).await?;
    content_response(content)
}

/// PUT /api/documents/{tenant}/{document}/content
pub async fn update_content(
    State(state): State<AppState>,
    actor: Actor,
    DocumentPath(key): DocumentPath,
    Json(req): Json<UpdateContentRequest>,
) -> Result<Json<ApiResponse<DocumentMetadata>>, ApiError> {
    let metadata = state
        .documents
        .update_content(&actor, &key, req.into())
        .await?;
    Ok(Json(ApiResponse::ok(metadata)))
}

/// GET /api/documents/{tenant}/{document}/versions
pub async fn list_versions(
    State(state): State<AppState>,
    actor: Actor,
    DocumentPath(key): DocumentPath,
) -> Result<Json<ApiResponse<Vec<DocumentVersion>>>, ApiError> {
    let versions = state.documents.list_versions(&actor, &key).await?;
    Ok(Json(ApiResponse::ok(versions)))
}

/// GET /api/documents/{tenant}/{document}/versions/{version}/content
pub async fn get_version_content(
    State(state): State<AppState>,
    actor: Actor,
    VersionPath(key, version): VersionPath,
) -> Result<Response, ApiError> {
    let content = state
        .documents
        .read_content(&actor, &key, Some(version))
        .await?;
    content_response(content)
}

/// POST /api/documents/{tenant}/{document}/versions/{version}/restore
pub async fn restore_version(
    State(state): State<AppState>,
    actor: Actor,
    VersionPath(key, version): VersionPath,
) -> Result<Json<ApiResponse<DocumentMetadata>>, ApiError> {
    let metadata = state
        .documents
        .restore_version(&actor, &key, version)
        .await?;
    Ok(Json(ApiResponse::ok(metadata)))
}

fn content_response(content: DocumentContent) -> Result<Response, ApiError> {
    let content_type = HeaderValue::from_str(&content.file_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(VERSION_HEADER, content.version)
        .header(header::CONTENT_LENGTH, content.data.len())
        .body(Body::from(content.data))
        .map_err(|e| AppError::internal(format!("Response build failed: {e}")))?;

    Ok(response.into_response())
}
