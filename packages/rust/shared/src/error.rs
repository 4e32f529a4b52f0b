//! Error types for DocDraft.
//!
//! Library crates use [`DocDraftError`] via `thiserror`.
//! The CLI app wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all DocDraft operations.
#[derive(Debug, thiserror::Error)]
pub enum DocDraftError {
    /// A requested release tag or branch does not exist on the Git host.
    #[error("not found: {0}")]
    NotFound(String),

    /// A failure reported by the Git host or the notification service,
    /// wrapping the underlying message. Never retried by the component
    /// that raised it.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Malformed inbound payload (webhook body, trigger input). At the
    /// webhook boundary these are converted into the ignore path rather
    /// than surfaced to the caller.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocDraftError>;

impl DocDraftError {
    /// Create a not-found error from any displayable message.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an upstream error from any displayable message.
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether a retry could plausibly succeed. Only upstream failures are
    /// transient; everything else is a permanent condition of this run.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Upstream(_))
    }
}
