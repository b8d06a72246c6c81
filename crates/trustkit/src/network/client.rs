//! HTTP client factory.
//!
//! Every client built here dials through a [`GatedConnector`], so the dial
//! gate applies regardless of verification mode or trust pool. Construction
//! only assembles configuration: no network I/O happens until a request is
//! sent, and malformed certificates never fail construction.
//!
//! # Security Mitigations
//!
//! - Dial gate checked per connection, below TLS
//! - Response body capped at `max_response_bytes` (10MB default)
//! - Whole request bounded by a timeout (30s default)
//! - Redirects are never followed
//! - Credentials redacted from request logs

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{CONTENT_LENGTH, USER_AGENT};
use http::{Request, Uri};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use tracing::{debug, trace};

use super::connector::GatedConnector;
use super::gate::{DialPolicy, global_policy};
use crate::error::{Error, Result};
use crate::logging_impl::LogConfig;
use crate::options::ClientOptions;
use crate::tls::{TlsConfig, TrustPool, VerificationMode, build_trust_pool, secure_baseline};

type Transport = HttpsConnector<GatedConnector<HttpConnector>>;

/// Return a client for `mode`, trusting `certs` (PEM) if any are given.
///
/// - With certificates: secure baseline plus a custom root pool; `NoVerify`
///   additionally skips verification but keeps the pool attached
/// - `Verify` without certificates: plain validating client on platform roots
/// - `NoVerify` without certificates: non-validating client, no pool
///
/// Dials go through the process-wide [`DialPolicy`].
pub fn get_client(mode: VerificationMode, certs: &[&str]) -> HttpClient {
    get_client_with_policy(mode, certs, global_policy().clone())
}

/// Like [`get_client`], with an explicit dial policy.
///
/// ```rust
/// use trustkit::{DialPolicy, VerificationMode, get_client_with_policy};
///
/// # tokio_test::block_on(async {
/// let client = get_client_with_policy(VerificationMode::NoVerify, &[], DialPolicy::local_only());
/// assert!(client.tls_config().insecure_skip_verify);
///
/// let err = client.get("https://93.184.216.34/").await.unwrap_err();
/// assert!(err.is_connection_refused());
/// # });
/// ```
pub fn get_client_with_policy(
    mode: VerificationMode,
    certs: &[&str],
    policy: DialPolicy,
) -> HttpClient {
    HttpClient::from_tls_config(tls_config_for(mode, certs), policy, ClientOptions::default())
        .expect("factory TLS configurations always resolve")
}

/// TLS policy [`get_client`] would use for `mode` and `certs`.
pub fn tls_config_for<B: AsRef<[u8]>>(mode: VerificationMode, certs: &[B]) -> TlsConfig {
    if !certs.is_empty() {
        let mut tls = secure_baseline();
        tls.root_cas = Some(build_trust_pool(certs));
        if mode == VerificationMode::NoVerify {
            tls.insecure_skip_verify = true;
        }
        return tls;
    }
    match mode {
        VerificationMode::Verify => TlsConfig::default(),
        VerificationMode::NoVerify => TlsConfig {
            insecure_skip_verify: true,
            ..TlsConfig::default()
        },
    }
}

/// HTTP request method
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Patch,
}

impl Method {
    fn as_http(self) -> http::Method {
        match self {
            Method::Get => http::Method::GET,
            Method::Post => http::Method::POST,
            Method::Put => http::Method::PUT,
            Method::Delete => http::Method::DELETE,
            Method::Head => http::Method::HEAD,
            Method::Patch => http::Method::PATCH,
        }
    }
}

/// HTTP response
#[derive(Debug)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response headers (key-value pairs)
    pub headers: Vec<(String, String)>,
    /// Response body
    pub body: Vec<u8>,
}

impl Response {
    /// Get the body as a UTF-8 string (lossy)
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Check if the response was successful (2xx status)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Outbound HTTP client bound to one TLS policy and one dial policy.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct HttpClient {
    client: Client<Transport, Full<Bytes>>,
    tls: Arc<TlsConfig>,
    policy: DialPolicy,
    options: ClientOptions,
    log: LogConfig,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("tls", &self.tls)
            .field("policy", &self.policy)
            .field("options", &self.options)
            .field("log", &self.log)
            .finish_non_exhaustive()
    }
}

/// Builder for clients that need more than [`get_client`] offers.
#[derive(Debug, Clone, Default)]
pub struct HttpClientBuilder {
    mode: VerificationMode,
    certs: Vec<Vec<u8>>,
    policy: Option<DialPolicy>,
    options: ClientOptions,
    log: LogConfig,
}

impl HttpClientBuilder {
    /// Set the verification mode.
    pub fn verification(mut self, mode: VerificationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Trust the certificates in a PEM input. Malformed input is skipped.
    pub fn root_certificate_pem(mut self, pem: impl AsRef<[u8]>) -> Self {
        self.certs.push(pem.as_ref().to_vec());
        self
    }

    /// Use `policy` instead of the process-wide dial policy.
    pub fn dial_policy(mut self, policy: DialPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Set transport options.
    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Set what request logging may reveal.
    pub fn log_config(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<HttpClient> {
        let tls = tls_config_for(self.mode, self.certs.as_slice());
        let policy = self.policy.unwrap_or_else(|| global_policy().clone());
        let mut client = HttpClient::from_tls_config(tls, policy, self.options)?;
        client.log = self.log;
        Ok(client)
    }
}

impl HttpClient {
    /// Create a builder.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Create a client from an explicit TLS policy.
    ///
    /// Fails only if `tls` cannot be resolved (see [`TlsConfig::to_rustls`]).
    pub fn from_tls_config(
        tls: TlsConfig,
        policy: DialPolicy,
        options: ClientOptions,
    ) -> Result<Self> {
        let rustls_config = tls.to_rustls()?;

        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_connect_timeout(Some(options.connect_timeout));

        let connector = HttpsConnectorBuilder::new()
            .with_tls_config(rustls_config)
            .https_or_http()
            .enable_http1()
            .wrap_connector(GatedConnector::new(http, policy.clone()));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        debug!(
            mode = ?tls.verification_mode(),
            custom_roots = tls.root_cas.as_ref().map_or(0, TrustPool::len),
            restricted_suites = tls.cipher_suites.is_some(),
            "built http client"
        );

        Ok(Self {
            client,
            tls: Arc::new(tls),
            policy,
            options,
            log: LogConfig::default(),
        })
    }

    /// The TLS policy this client was built with.
    pub fn tls_config(&self) -> &TlsConfig {
        &self.tls
    }

    pub fn verification_mode(&self) -> VerificationMode {
        self.tls.verification_mode()
    }

    /// Custom root pool, if any.
    pub fn root_pool(&self) -> Option<&TrustPool> {
        self.tls.root_cas.as_ref()
    }

    /// The dial policy consulted on every connection.
    pub fn dial_policy(&self) -> &DialPolicy {
        &self.policy
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn log_config(&self) -> &LogConfig {
        &self.log
    }

    /// Make a GET request.
    pub async fn get(&self, url: &str) -> Result<Response> {
        self.request(Method::Get, url, None).await
    }

    /// Make a HEAD request to get headers without body.
    pub async fn head(&self, url: &str) -> Result<Response> {
        self.request(Method::Head, url, None).await
    }

    /// Make a POST request with optional body.
    pub async fn post(&self, url: &str, body: Option<&[u8]>) -> Result<Response> {
        self.request(Method::Post, url, body).await
    }

    /// Make a PUT request with optional body.
    pub async fn put(&self, url: &str, body: Option<&[u8]>) -> Result<Response> {
        self.request(Method::Put, url, body).await
    }

    /// Make a DELETE request.
    pub async fn delete(&self, url: &str) -> Result<Response> {
        self.request(Method::Delete, url, None).await
    }

    /// Make an HTTP request.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&[u8]>,
    ) -> Result<Response> {
        self.request_with_headers(method, url, body, &[]).await
    }

    /// Make an HTTP request with custom headers.
    ///
    /// A dial refused by the gate surfaces as [`Error::ConnectionRefused`].
    /// Nothing is retried.
    pub async fn request_with_headers(
        &self,
        method: Method,
        url: &str,
        body: Option<&[u8]>,
        headers: &[(String, String)],
    ) -> Result<Response> {
        let uri = parse_url(url)?;

        let mut builder = Request::builder()
            .method(method.as_http())
            .uri(uri)
            .header(USER_AGENT, self.options.user_agent.as_str());
        for (name, value) in headers {
            trace!(header = %name, value = %self.log.redact_header(name, value), "request header");
            builder = builder.header(name.as_str(), value.as_str());
        }
        let body = body.map(Bytes::copy_from_slice).unwrap_or_default();
        let request = builder
            .body(Full::new(body))
            .map_err(|e| Error::InvalidRequest(e.to_string()))?;

        debug!(?method, url = %self.log.redact_url(url), "sending request");

        match tokio::time::timeout(self.options.timeout, self.send(request)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout),
        }
    }

    async fn send(&self, request: Request<Full<Bytes>>) -> Result<Response> {
        let response = self
            .client
            .request(request)
            .await
            .map_err(map_transport_error)?;
        let (parts, body) = response.into_parts();

        let status = parts.status.as_u16();
        let headers: Vec<(String, String)> = parts
            .headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();

        // Fail fast when the server announces an oversized body
        let max = self.options.max_response_bytes;
        let announced = parts
            .headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        if announced.is_some_and(|len| len > max as u64) {
            return Err(Error::ResponseTooLarge { limit: max });
        }

        let body = Limited::new(body, max)
            .collect()
            .await
            .map_err(|e| {
                if e.is::<LengthLimitError>() {
                    Error::ResponseTooLarge { limit: max }
                } else {
                    Error::Network(format!("failed to read response body: {}", e))
                }
            })?
            .to_bytes();

        trace!(status, bytes = body.len(), "response received");
        Ok(Response {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

fn parse_url(url: &str) -> Result<Uri> {
    let uri: Uri = url
        .parse()
        .map_err(|e| Error::InvalidRequest(format!("invalid URL: {}", e)))?;
    match uri.scheme_str() {
        Some("http") | Some("https") => {}
        _ => {
            return Err(Error::InvalidRequest(
                "URL scheme must be http or https".to_string(),
            ));
        }
    }
    if uri.host().is_none() {
        return Err(Error::InvalidRequest("URL has no host".to_string()));
    }
    Ok(uri)
}

/// Recover a gate refusal from hyper's error chain; anything else is a plain
/// network error.
fn map_transport_error(err: hyper_util::client::legacy::Error) -> Error {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(&err);
    while let Some(e) = source {
        if let Some(Error::ConnectionRefused { addr }) = e.downcast_ref::<Error>() {
            return Error::connection_refused(addr.clone());
        }
        source = e.source();
    }
    Error::Network(format!("request failed: {}", err))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tls::TlsVersion;

    const CA_A: &str = include_str!("../../tests/fixtures/ca_a.pem");
    const CA_B: &str = include_str!("../../tests/fixtures/ca_b.pem");

    #[test]
    fn test_no_verify_without_certs() {
        let tls = tls_config_for::<&str>(VerificationMode::NoVerify, &[]);
        assert!(tls.insecure_skip_verify);
        assert!(tls.root_cas.is_none());
    }

    #[test]
    fn test_no_verify_with_certs_keeps_pool() {
        let tls = tls_config_for(VerificationMode::NoVerify, &[CA_A]);
        assert!(tls.insecure_skip_verify);
        let pool = tls.root_cas.as_ref().unwrap();
        assert!(pool.contains_pem(CA_A.as_bytes()));
        // Custom-CA clients start from the secure baseline
        assert_eq!(tls.cipher_suites, secure_baseline().cipher_suites);
    }

    #[test]
    fn test_verify_without_certs() {
        let tls = tls_config_for::<&str>(VerificationMode::Verify, &[]);
        assert!(!tls.insecure_skip_verify);
        assert!(tls.root_cas.is_none());
        assert!(tls.cipher_suites.is_none());
    }

    #[test]
    fn test_verify_with_certs() {
        let tls = tls_config_for(VerificationMode::Verify, &[CA_A, CA_B]);
        assert!(!tls.insecure_skip_verify);
        assert_eq!(tls.min_version, TlsVersion::Tls12);
        assert_eq!(tls.root_cas.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_malformed_certs_do_not_fail_construction() {
        let tls = tls_config_for(VerificationMode::Verify, &["garbage"]);
        assert!(!tls.insecure_skip_verify);
        assert!(tls.root_cas.as_ref().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_client_variants() {
        let policy = DialPolicy::unrestricted();

        let client = get_client_with_policy(VerificationMode::NoVerify, &[], policy.clone());
        assert_eq!(client.verification_mode(), VerificationMode::NoVerify);
        assert!(client.root_pool().is_none());

        let client = get_client_with_policy(VerificationMode::NoVerify, &[CA_A], policy.clone());
        assert!(client.tls_config().insecure_skip_verify);
        assert!(client.root_pool().unwrap().contains_pem(CA_A.as_bytes()));

        let client = get_client_with_policy(VerificationMode::Verify, &[], policy);
        assert_eq!(client.verification_mode(), VerificationMode::Verify);
        assert!(client.root_pool().is_none());
    }

    #[tokio::test]
    async fn test_refused_dial_surfaces_as_connection_refused() {
        let client =
            get_client_with_policy(VerificationMode::Verify, &[], DialPolicy::local_only());

        let err = client.get("http://93.184.216.34/").await.unwrap_err();
        assert!(err.is_connection_refused(), "unexpected error: {}", err);

        let err = client.get("https://93.184.216.34/").await.unwrap_err();
        assert!(err.is_connection_refused(), "unexpected error: {}", err);
    }

    #[tokio::test]
    async fn test_invalid_urls_rejected_before_dial() {
        let client =
            get_client_with_policy(VerificationMode::Verify, &[], DialPolicy::local_only());

        assert!(matches!(
            client.get("not a url").await,
            Err(Error::InvalidRequest(_))
        ));
        assert!(matches!(
            client.get("/relative/path").await,
            Err(Error::InvalidRequest(_))
        ));
        assert!(matches!(
            client.get("ftp://example.com/").await,
            Err(Error::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_builder_uses_injected_policy() {
        let policy = DialPolicy::local_only();
        let client = HttpClient::builder()
            .verification(VerificationMode::NoVerify)
            .root_certificate_pem(CA_B)
            .dial_policy(policy.clone())
            .build()
            .unwrap();

        assert!(!client.dial_policy().outgoing_access_allowed());
        policy.set_outgoing_access_allowed(true);
        assert!(client.dial_policy().outgoing_access_allowed());
        assert!(client.root_pool().unwrap().contains_pem(CA_B.as_bytes()));
    }

    #[test]
    fn test_builder_log_config() {
        let client = HttpClient::builder()
            .dial_policy(DialPolicy::local_only())
            .build()
            .unwrap();
        assert!(client.log_config().redact_sensitive);
        assert_eq!(
            client.log_config().redact_header("Authorization", "Basic YTpi"),
            "[REDACTED]"
        );

        let client = HttpClient::builder()
            .dial_policy(DialPolicy::local_only())
            .log_config(LogConfig::new().unsafe_disable_redaction().max_value_length(8))
            .build()
            .unwrap();
        assert!(!client.log_config().redact_sensitive);
        assert_eq!(client.log_config().max_value_length, 8);
        assert_eq!(
            client.log_config().redact_header("Authorization", "Basic YTpi"),
            "Basic YT...[truncated 2 bytes]"
        );
    }
}
