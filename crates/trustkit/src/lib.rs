//! Trustkit - Trust configuration for outbound HTTP clients
//!
//! Part of the Everruns ecosystem.
//!
//! - [`get_client`] builds a client for a [`VerificationMode`] and optional
//!   PEM certificate authorities
//! - [`auth`] encodes and decodes `Authorization: Basic` headers
//! - [`DialPolicy`] / [`set_outgoing_access_allowed`] restrict every dial to
//!   loopback addresses
//!
//! # Example
//!
//! ```rust,no_run
//! use trustkit::{DialPolicy, VerificationMode, get_client_with_policy};
//!
//! #[tokio::main]
//! async fn main() -> trustkit::Result<()> {
//!     let policy = DialPolicy::local_only();
//!     let client = get_client_with_policy(VerificationMode::Verify, &[], policy);
//!
//!     let err = client.get("https://example.com/").await.unwrap_err();
//!     assert!(err.is_connection_refused());
//!
//!     let resp = client.get("http://127.0.0.1:8080/health").await?;
//!     println!("{}", resp.status);
//!     Ok(())
//! }
//! ```

pub mod auth;
mod error;
pub mod logging_impl;
pub mod network;
mod options;
pub mod tls;

pub use auth::Credentials;
pub use error::{Error, Result};
pub use logging_impl::LogConfig;
pub use network::{
    DialPolicy, HttpClient, HttpClientBuilder, Method, Response, get_client,
    get_client_with_policy, global_policy, is_local, outgoing_access_allowed,
    set_outgoing_access_allowed,
};
pub use options::{
    ClientOptions, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_MAX_RESPONSE_BYTES, DEFAULT_TIMEOUT_SECS,
    DEFAULT_USER_AGENT, MAX_TIMEOUT_SECS, MIN_TIMEOUT_SECS,
};
pub use tls::{TlsConfig, TrustPool, VerificationMode, build_trust_pool, secure_baseline};
