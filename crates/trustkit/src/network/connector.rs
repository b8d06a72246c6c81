//! Connector wrapper that applies the dial gate.
//!
//! [`GatedConnector`] sits directly around the TCP connector, below TLS, so a
//! refused destination never reaches `connect(2)` and no handshake starts.

use std::pin::Pin;
use std::task::{Context, Poll};

use http::Uri;
use tower::Service;

use super::gate::DialPolicy;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Wraps a connector so every dial is checked against a [`DialPolicy`].
#[derive(Debug, Clone)]
pub struct GatedConnector<C> {
    inner: C,
    policy: DialPolicy,
}

impl<C> GatedConnector<C> {
    pub fn new(inner: C, policy: DialPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &DialPolicy {
        &self.policy
    }
}

impl<C> Service<Uri> for GatedConnector<C>
where
    C: Service<Uri>,
    C::Error: Into<BoxError>,
    C::Future: Send + 'static,
{
    type Response = C::Response;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<C::Response, BoxError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, dst: Uri) -> Self::Future {
        let addr = dial_address(&dst);
        if let Err(err) = self.policy.allow_dial(&addr) {
            return Box::pin(async move { Err(err.into()) });
        }
        let connecting = self.inner.call(dst);
        Box::pin(async move { connecting.await.map_err(Into::into) })
    }
}

/// `host:port` the transport will dial for `uri`, with IPv6 hosts bracketed
/// and the port defaulted from the scheme.
pub fn dial_address(uri: &Uri) -> String {
    let host = uri.host().unwrap_or_default();
    let port = uri
        .port_u16()
        .unwrap_or_else(|| match uri.scheme_str() {
            Some("https") => 443,
            _ => 80,
        });
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}
