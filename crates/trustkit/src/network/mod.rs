//! Network layer for Trustkit
//!
//! Builds outbound HTTP clients whose transport dials through the dial gate.
//!
//! # Security Model
//!
//! - Outgoing access is allowed by default; turning it off restricts every
//!   client sharing the policy to loopback destinations
//! - The gate runs at the transport's dial step, before TCP or TLS
//! - Unparsable destinations are treated as non-local

mod client;
mod connector;
mod gate;

pub use client::{
    HttpClient, HttpClientBuilder, Method, Response, get_client, get_client_with_policy,
    tls_config_for,
};
pub use connector::{GatedConnector, dial_address};
pub use gate::{
    DialPolicy, global_policy, is_local, outgoing_access_allowed, set_outgoing_access_allowed,
    split_host_port,
};
