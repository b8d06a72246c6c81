//! TLS trust configuration.
//!
//! - [`secure_baseline`] is the hardened starting point for every client
//! - [`build_trust_pool`] turns PEM material into custom root authorities
//! - [`TlsConfig::to_rustls`] resolves the policy for the transport

mod config;
mod pool;
mod verifier;

pub use config::{
    TlsConfig, TlsVersion, VerificationMode, secure_baseline, secure_cipher_suites,
};
pub use pool::{TrustPool, build_trust_pool};
