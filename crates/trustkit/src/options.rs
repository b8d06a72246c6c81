//! Transport options for clients built by the factory.
//!
//! These bound what a single request may consume. They do not affect trust
//! decisions; see [`crate::tls`] and [`crate::network`] for those.

use std::time::Duration;

/// Default maximum response body size (10 MB)
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 10 * 1024 * 1024;

/// Default request timeout (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default connect timeout (10 seconds)
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Maximum allowed timeout (10 minutes)
pub const MAX_TIMEOUT_SECS: u64 = 600;

/// Minimum allowed timeout (1 second)
pub const MIN_TIMEOUT_SECS: u64 = 1;

/// Default `User-Agent` header
pub const DEFAULT_USER_AGENT: &str = concat!("trustkit/", env!("CARGO_PKG_VERSION"));

/// Per-client transport options.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Overall request timeout, covering connect, send and body read
    /// Default: 30 seconds
    pub timeout: Duration,

    /// TCP connect timeout
    /// Default: 10 seconds
    pub connect_timeout: Duration,

    /// Maximum response body size in bytes
    /// Default: 10 MB
    pub max_response_bytes: usize,

    /// Value sent as `User-Agent`
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set request timeout, clamped to [`MIN_TIMEOUT_SECS`, `MAX_TIMEOUT_SECS`]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = clamp_timeout(timeout);
        self
    }

    /// Set connect timeout, clamped like [`ClientOptions::timeout`]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = clamp_timeout(timeout);
        self
    }

    /// Set maximum response body size
    pub fn max_response_bytes(mut self, bytes: usize) -> Self {
        self.max_response_bytes = bytes;
        self
    }

    /// Set the `User-Agent` header value
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

fn clamp_timeout(timeout: Duration) -> Duration {
    timeout.clamp(
        Duration::from_secs(MIN_TIMEOUT_SECS),
        Duration::from_secs(MAX_TIMEOUT_SECS),
    )
}
