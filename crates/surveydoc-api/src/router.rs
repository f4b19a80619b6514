//! Route definitions for the SurveyDoc HTTP API.
//!
//! All routes are mounted under `/api`. The router receives `AppState` and
//! passes it to all handlers via Axum's `State` extractor.

use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::compression::CompressionLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let server = &state.config.server;
    let cors = middleware::cors::build_cors_layer(&server.cors);
    let timeout = Duration::from_secs(server.request_timeout_seconds);
    let max_body = server.max_body_bytes;

    let api_routes = Router::new()
        .route("/health", get(handlers::health::health))
        .merge(document_routes());

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(max_body))
        .layer(TimeoutLayer::new(timeout))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Document CRUD, content, and version history
fn document_routes() -> Router<AppState> {
    use handlers::document as doc;

    Router::new()
        .route(
            "/documents/{tenant}/{document}",
            post(doc::create_document)
                .get(doc::get_document)
                .delete(doc::delete_document),
        )
        .route(
            "/documents/{tenant}/{document}/content",
            get(doc::get_content).put(doc::update_content),
        )
        .route(
            "/documents/{tenant}/{document}/versions",
            get(doc::list_versions),
        )
        .route(
            "/documents/{tenant}/{document}/versions/{version}/content",
            get(doc::get_version_content),
        )
        .route(
            "/documents/{tenant}/{document}/versions/{version}/restore",
            post(doc::restore_version),
        )
}
