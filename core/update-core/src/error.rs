//! Error types for the software updates helper.
//!
//! Every variant maps to one failure class the helper distinguishes when
//! deciding whether an invocation is fatal, logged-and-ignored, or silent.

use std::path::PathBuf;

/// All errors that can occur while handling a push message.
#[derive(Debug, thiserror::Error)]
pub enum HelperError {
    // ─────────────────────────────────────────────────────────────────────
    // Invocation Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Malformed push payload in {path}: {source}")]
    MalformedPayload {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration malformed: {path}: {details}")]
    Config { path: PathBuf, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // Background Worker Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Could not detach background worker: {0}")]
    DetachFailure(#[source] std::io::Error),

    #[error("{service} unavailable: {details}")]
    RemoteServiceUnavailable { service: String, details: String },

    #[error("Failed to publish notification {tag}: {details}")]
    PublishFailure { tag: String, details: String },
}

impl HelperError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        HelperError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn unavailable(service: impl Into<String>, details: impl ToString) -> Self {
        HelperError::RemoteServiceUnavailable {
            service: service.into(),
            details: details.to_string(),
        }
    }
}

/// Convenience type alias for Results using HelperError.
pub type Result<T> = std::result::Result<T, HelperError>;
