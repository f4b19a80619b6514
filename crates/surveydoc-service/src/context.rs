//! Request context carrying the acting identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Actor recorded for maintenance and command-line operations.
pub const SYSTEM_ACTOR: &str = "system";

/// Context for the current request.
///
/// Built by the API layer (or the CLI) and passed into service methods so
/// that every operation knows *who* is acting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// Identity written as the author of new versions.
    pub actor_id: String,
    /// Whether document access lists are bypassed.
    pub is_system: bool,
    /// Origin of the request, if known.
    pub ip_address: Option<String>,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a context for an end-user actor.
    pub fn new(actor_id: impl Into<String>, ip_address: Option<String>) -> Self {
        Self {
            actor_id: actor_id.into(),
            is_system: false,
            ip_address,
            request_time: Utc::now(),
        }
    }

    /// Creates a context for internal tooling, exempt from access lists.
    pub fn system() -> Self {
        Self {
            actor_id: SYSTEM_ACTOR.to_string(),
            is_system: true,
            ip_address: None,
            request_time: Utc::now(),
        }
    }
}
