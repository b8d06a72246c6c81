//! Dial gate: a switch that restricts outbound connections to loopback.
//!
//! # Security Model
//!
//! - Outgoing access is allowed by default
//! - When disallowed, only `localhost` and loopback IPs may be dialled
//! - Addresses that cannot be parsed are treated as non-local (fail closed)
//! - The check runs before any socket is opened
//!
//! [`DialPolicy`] is a shared handle: clones observe the same switch. The
//! process-wide instance returned by [`global_policy`] is what
//! [`crate::get_client`] uses; tests and embedders can inject their own.

use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};

use tracing::trace;

use crate::error::{Error, Result};

/// Shared outgoing-access switch consulted on every dial.
#[derive(Debug, Clone)]
pub struct DialPolicy {
    outgoing_access_allowed: Arc<AtomicBool>,
}

impl Default for DialPolicy {
    fn default() -> Self {
        Self::new(true)
    }
}

impl DialPolicy {
    /// Create a policy with the given initial switch value.
    pub fn new(outgoing_access_allowed: bool) -> Self {
        Self {
            outgoing_access_allowed: Arc::new(AtomicBool::new(outgoing_access_allowed)),
        }
    }

    /// Policy that lets every dial through.
    pub fn unrestricted() -> Self {
        Self::new(true)
    }

    /// Policy that only lets loopback dials through.
    pub fn local_only() -> Self {
        Self::new(false)
    }

    /// Whether non-local addresses may currently be dialled.
    pub fn outgoing_access_allowed(&self) -> bool {
        self.outgoing_access_allowed.load(Ordering::Acquire)
    }

    /// Flip the switch. Takes effect on the next dial of every client
    /// sharing this policy; dials already past the check are unaffected.
    pub fn set_outgoing_access_allowed(&self, allowed: bool) {
        self.outgoing_access_allowed.store(allowed, Ordering::Release);
    }

    /// Check a `host:port` dial target.
    ///
    /// Returns [`Error::ConnectionRefused`] when outgoing access is disallowed
    /// and the address is not local.
    pub fn allow_dial(&self, addr: &str) -> Result<()> {
        if self.outgoing_access_allowed() || is_local(addr) {
            trace!(addr, "dial allowed");
            return Ok(());
        }
        trace!(addr, "dial refused");
        Err(Error::connection_refused(addr))
    }
}

static GLOBAL_POLICY: LazyLock<DialPolicy> = LazyLock::new(DialPolicy::default);

/// The process-wide policy used by [`crate::get_client`].
pub fn global_policy() -> &'static DialPolicy {
    &GLOBAL_POLICY
}

/// Whether the process-wide policy allows non-local dials.
pub fn outgoing_access_allowed() -> bool {
    GLOBAL_POLICY.outgoing_access_allowed()
}

/// Set the process-wide switch.
pub fn set_outgoing_access_allowed(allowed: bool) {
    GLOBAL_POLICY.set_outgoing_access_allowed(allowed);
}

/// True if `addr` (`host:port`) names `localhost` or a loopback IP.
///
/// IPv6 hosts must be bracketed (`[::1]:443`). Addresses without a port or
/// with an unparsable host are not local.
pub fn is_local(addr: &str) -> bool {
    let Some((host, _port)) = split_host_port(addr) else {
        return false;
    };
    if host == "localhost" {
        return true;
    }
    match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => ip.is_loopback(),
        Ok(IpAddr::V6(ip)) => {
            ip.is_loopback() || ip.to_ipv4_mapped().is_some_and(|v4| v4.is_loopback())
        }
        Err(_) => false,
    }
}

/// Split `host:port` or `[host]:port` into host and port.
///
/// Returns `None` when the port separator is missing, brackets are
/// unbalanced, or an unbracketed host contains a colon.
pub fn split_host_port(addr: &str) -> Option<(&str, &str)> {
    if let Some(rest) = addr.strip_prefix('[') {
        let end = rest.find(']')?;
        let host = &rest[..end];
        let port = rest[end + 1..].strip_prefix(':')?;
        if host.contains(['[', ']']) || port.contains(['[', ']', ':']) {
            return None;
        }
        return Some((host, port));
    }

    let colon = addr.rfind(':')?;
    let (host, port) = (&addr[..colon], &addr[colon + 1..]);
    if host.contains([':', '[', ']']) || port.contains(['[', ']']) {
        return None;
    }
    Some((host, port))
}
