//! `[server]` section: HTTP listener, limits and CORS.

use serde::{Deserialize, Serialize};

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Per-request timeout in seconds.
    pub request_timeout_seconds: u64,
    /// How long shutdown waits for background jobs, in seconds.
    pub shutdown_grace_seconds: u64,
    /// Largest accepted request body. Document content travels inline, so
    /// this also caps document size.
    pub max_body_bytes: usize,
    /// Cross-origin access for browser-based editors.
    pub cors: CorsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_seconds: 30,
            shutdown_grace_seconds: 30,
            max_body_bytes: 16 * 1024 * 1024,
            cors: CorsConfig::default(),
        }
    }
}

/// CORS settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed to call the API; `"*"` allows any.
    pub allowed_origins: Vec<String>,
    /// Preflight cache lifetime in seconds.
    pub max_age_seconds: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            max_age_seconds: 3600,
        }
    }
}
