//! Error types for Trustkit
//!
//! Design goals:
//! - Human-readable messages that never carry credentials
//! - Clear categorization so callers can react to a refused dial or a bad
//!   `Authorization` header without string matching
//!
//! Malformed certificate material is deliberately *not* an error: it is
//! skipped while building a trust pool (see [`crate::tls::build_trust_pool`]).

use thiserror::Error;

/// Result type alias using Trustkit's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Trustkit error types.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or missing Basic-Auth header.
    ///
    /// Always recoverable: callers should treat the request as unauthenticated.
    #[error("invalid basic auth header: {0}")]
    AuthFormat(String),

    /// Dial refused by the dial gate before any connection was attempted.
    #[error("connection refused: outgoing access to {addr} is not allowed")]
    ConnectionRefused { addr: String },

    /// TLS configuration cannot be resolved (e.g. no usable cipher suites).
    #[error("tls configuration error: {0}")]
    Tls(String),

    /// Request could not be built (bad URL, bad header name or value).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Transport-level failure after the dial gate let the request through.
    #[error("network error: {0}")]
    Network(String),

    /// Request exceeded the configured timeout.
    #[error("operation timed out")]
    Timeout,

    /// Response body exceeded the configured size limit.
    #[error("response too large: exceeded {limit} bytes limit")]
    ResponseTooLarge { limit: usize },

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an auth format error.
    pub fn auth_format(message: impl Into<String>) -> Self {
        Self::AuthFormat(message.into())
    }

    /// Create a dial refusal for the given `host:port` address.
    pub fn connection_refused(addr: impl Into<String>) -> Self {
        Self::ConnectionRefused { addr: addr.into() }
    }

    /// True if this error came from the dial gate.
    pub fn is_connection_refused(&self) -> bool {
        matches!(self, Self::ConnectionRefused { .. })
    }
}
