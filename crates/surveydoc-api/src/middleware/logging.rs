//! Access log middleware.

use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{info, warn};

use crate::extractors::actor::ACTOR_HEADER;
use crate::handlers::document::VERSION_HEADER;

/// Logs one line per request: who did what, the outcome, and any document
/// version returned. Server errors are logged at `warn`.
pub async fn request_logging(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let actor = request
        .headers()
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let version = response
        .headers()
        .get(VERSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if status.is_server_error() {
        warn!(%method, %path, actor = ?actor, status = status.as_u16(), elapsed_ms, "Request failed");
    } else {
        info!(
            %method,
            %path,
            actor = ?actor,
            status = status.as_u16(),
            version = ?version,
            elapsed_ms,
            "Request served"
        );
    }

    response
}
