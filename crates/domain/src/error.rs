//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The provided URL is invalid or malformed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A request path escaped the configured site origin.
    #[error("path '{path}' does not resolve under {base}")]
    ForeignOrigin {
        /// The offending path.
        path: String,
        /// The site base URL.
        base: String,
    },

    /// A backend endpoint could not be parsed.
    #[error("invalid backend endpoint: {0}")]
    InvalidEndpoint(String),

    /// A similarity threshold is out of range or inconsistent.
    #[error("invalid threshold: {0}")]
    InvalidThreshold(String),

    /// A classification marker is empty.
    #[error("invalid marker '{name}': must not be empty")]
    EmptyMarker {
        /// Name of the marker field.
        name: &'static str,
    },

    /// A header name or value cannot be sent on the wire.
    #[error("invalid header: {0}")]
    InvalidHeader(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
