//! Error types for Tessera
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! The taxonomy separates client-input failures (temporal validation, which
//! must be rejected before any backend mutation) from backend failures, which
//! are propagated unmodified with no retry inside the routing engine.

use thiserror::Error;

/// Result type alias for Tessera operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the Tessera routing engine
#[derive(Debug, Error)]
pub enum Error {
    /// Temporal validation failure on insert (client input error)
    #[error("Invalid temporal fields: {0}")]
    Validation(String),

    /// Backend document-store failure, surfaced unmodified
    #[error("Backend error: {0}")]
    Backend(String),

    /// Index creation hit an existing index of the same name
    ///
    /// Raised by `DocumentStore` implementations; swallowed by the index
    /// operations layer, where "already exists" is success.
    #[error("Index already exists: {0}")]
    IndexAlreadyExists(String),

    /// An alias that should resolve to exactly one index did not
    #[error("Unresolved alias: {0}")]
    UnresolvedAlias(String),

    /// An alias name that does not parse under the boundary grammar
    #[error("Malformed boundary alias: {0}")]
    MalformedAlias(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error is the caller's fault (maps to a 4xx-class
    /// response at the HTTP boundary). Everything else is 5xx-class.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}
