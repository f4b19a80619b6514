//! Error type shared by every SurveyDoc crate.
//!
//! Stores, services and handlers all return [`AppError`]. The [`ErrorKind`]
//! is what callers branch on: the versioning protocol, for instance, tells a
//! lost race (`Conflict`) apart from a broken backend (`Database`).

use std::fmt;
use thiserror::Error;

/// Category of an [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Document, version or blob does not exist.
    NotFound,
    /// No acting identity was supplied.
    Authentication,
    /// The actor is not on the document's access lists.
    Authorization,
    /// Malformed key, path or request body.
    Validation,
    /// The target already exists or moved on (duplicate create, stale version,
    /// claimed blob path).
    Conflict,
    /// Invariant broken inside the process.
    Internal,
    /// Record store failure.
    Database,
    /// Blob store failure.
    Storage,
    /// Unusable settings.
    Configuration,
    /// Encoding or decoding failed.
    Serialization,
}

impl ErrorKind {
    /// Stable upper-case name, used in logs and in `Display`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Authentication => "AUTHENTICATION",
            Self::Authorization => "AUTHORIZATION",
            Self::Validation => "VALIDATION",
            Self::Conflict => "CONFLICT",
            Self::Internal => "INTERNAL",
            Self::Database => "DATABASE",
            Self::Storage => "STORAGE",
            Self::Configuration => "CONFIGURATION",
            Self::Serialization => "SERIALIZATION",
        }
    }

    /// Whether the fault lies with the server rather than the request.
    pub fn is_server_fault(&self) -> bool {
        matches!(
            self,
            Self::Internal
                | Self::Database
                | Self::Storage
                | Self::Configuration
                | Self::Serialization
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned throughout SurveyDoc.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// What went wrong, coarsely.
    pub kind: ErrorKind,
    /// Message safe to show to the caller.
    pub message: String,
    /// Underlying cause, if any.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Error of `kind` without a cause.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Error of `kind` wrapping `source`.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns `true` if this error is of the given kind.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

macro_rules! kind_constructors {
    ($($name:ident => $kind:ident),* $(,)?) => {
        impl AppError {
            $(
                #[doc = concat!("Error of kind [`ErrorKind::", stringify!($kind), "`].")]
                pub fn $name(message: impl Into<String>) -> Self {
                    Self::new(ErrorKind::$kind, message)
                }
            )*
        }
    };
}

kind_constructors! {
    not_found => NotFound,
    authentication => Authentication,
    authorization => Authorization,
    validation => Validation,
    conflict => Conflict,
    internal => Internal,
    database => Database,
    storage => Storage,
    configuration => Configuration,
}

// The boxed cause is not cloneable; clones keep kind and message only.
impl Clone for AppError {
    fn clone(&self) -> Self {
        Self::new(self.kind, self.message.clone())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorKind::Serialization, format!("Invalid JSON: {err}"), err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Storage, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
