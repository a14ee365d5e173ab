//! Error types for the de-obfuscation library.
//!
//! This module defines the errors that can escape a library call. Per-chapter
//! and per-font failures are absorbed by the pipeline and turned into
//! placeholder data (see [`FailureReason`](crate::extractors::FailureReason) and
//! [`FontOutcome`](crate::fonts::FontOutcome)), so most of these only surface
//! from the catalog fetch, configuration loading, and output writing.

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while fetching, decoding, and assembling chapters.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level failure (DNS, TLS, timeout, connection reset)
    #[error("Request to {url} failed: {reason}")]
    Http {
        /// Requested URL
        url: String,
        /// Transport error description
        reason: String,
    },

    /// Server answered with a non-success status
    #[error("Request to {url} returned HTTP {status}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// Caller supplied input that cannot produce any output
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Configuration file could not be deserialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Stream decompression error
    #[error("Stream decoding error: {0}")]
    Decode(String),

    /// Font container or table error
    #[error("Font error: {0}")]
    Font(#[from] crate::fonts::FontError),
}
