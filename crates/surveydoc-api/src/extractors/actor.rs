//! `Actor` extractor: identifies the caller from the `x-actor-id` header.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use surveydoc_core::error::AppError;
use surveydoc_service::RequestContext;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the acting user's identity.
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Caller context available in handlers.
#[derive(Debug, Clone)]
pub struct Actor(pub RequestContext);

impl std::ops::Deref for Actor {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for Actor {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let actor_id = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::authentication("Missing x-actor-id header"))?;

        let ip_address = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        Ok(Actor(RequestContext::new(actor_id, ip_address)))
    }
}
