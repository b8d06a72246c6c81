//! TLS policy model and its resolution into a rustls client configuration.

use std::sync::{Arc, LazyLock};

use rustls::crypto::ring;
use rustls::{ClientConfig, RootCertStore, SupportedCipherSuite, SupportedProtocolVersion};
use tracing::{debug, warn};

use super::pool::TrustPool;
use super::verifier::SkipServerVerification;
use crate::error::{Error, Result};

/// Whether a client validates the server's certificate chain and hostname.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerificationMode {
    /// Validate chain and hostname.
    #[default]
    Verify,
    /// Skip chain and hostname validation.
    NoVerify,
}

/// Lowest TLS protocol version a client will negotiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TlsVersion {
    Tls12,
    Tls13,
}

/// Resolved TLS policy for one client.
///
/// `insecure_skip_verify` and `root_cas` are independent: a client can carry
/// a custom pool while skipping verification, and a non-empty pool never
/// turns verification off.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub min_version: TlsVersion,
    /// Allowed cipher suites; `None` keeps the provider defaults.
    pub cipher_suites: Option<Vec<SupportedCipherSuite>>,
    pub insecure_skip_verify: bool,
    /// Custom root authorities; `None` means the platform roots.
    pub root_cas: Option<TrustPool>,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            min_version: TlsVersion::Tls12,
            cipher_suites: None,
            insecure_skip_verify: false,
            root_cas: None,
        }
    }
}

/// The AEAD-only suite list used by [`secure_baseline`].
pub fn secure_cipher_suites() -> Vec<SupportedCipherSuite> {
    use ring::cipher_suite::*;
    vec![
        TLS13_AES_128_GCM_SHA256,
        TLS13_AES_256_GCM_SHA384,
        TLS13_CHACHA20_POLY1305_SHA256,
        TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
        TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,
        TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256,
        TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
        TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
        TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256,
    ]
}

/// Baseline configuration every hardened client starts from: TLS 1.2 or
/// later, AEAD suites only, verification on, no custom roots.
pub fn secure_baseline() -> TlsConfig {
    TlsConfig {
        min_version: TlsVersion::Tls12,
        cipher_suites: Some(secure_cipher_suites()),
        insecure_skip_verify: false,
        root_cas: None,
    }
}

// Loaded on first use and shared by every client that relies on the
// platform trust store.
static PLATFORM_ROOTS: LazyLock<Arc<RootCertStore>> = LazyLock::new(load_platform_roots);

fn load_platform_roots() -> Arc<RootCertStore> {
    let loaded = rustls_native_certs::load_native_certs();
    if !loaded.errors.is_empty() {
        warn!(
            errors = loaded.errors.len(),
            "some platform root certificates could not be loaded"
        );
    }
    let mut roots = RootCertStore::empty();
    let (added, ignored) = roots.add_parsable_certificates(loaded.certs);
    debug!(added, ignored, "loaded platform root certificates");
    Arc::new(roots)
}

impl TlsConfig {
    /// The verification mode this configuration implies.
    pub fn verification_mode(&self) -> VerificationMode {
        if self.insecure_skip_verify {
            VerificationMode::NoVerify
        } else {
            VerificationMode::Verify
        }
    }

    /// Resolve into a rustls client configuration using the ring provider.
    ///
    /// Fails only if the cipher suite list and minimum version leave nothing
    /// to negotiate.
    pub fn to_rustls(&self) -> Result<ClientConfig> {
        let mut provider = ring::default_provider();
        if let Some(suites) = &self.cipher_suites {
            provider.cipher_suites = suites.clone();
        }
        let provider = Arc::new(provider);

        let versions: Vec<&'static SupportedProtocolVersion> = match self.min_version {
            TlsVersion::Tls12 => vec![&rustls::version::TLS13, &rustls::version::TLS12],
            TlsVersion::Tls13 => vec![&rustls::version::TLS13],
        };

        let builder = ClientConfig::builder_with_provider(Arc::clone(&provider))
            .with_protocol_versions(&versions)
            .map_err(|e| Error::Tls(e.to_string()))?;

        let config = if self.insecure_skip_verify {
            builder
                .dangerous()
                .with_custom_certificate_verifier(SkipServerVerification::new(provider))
                .with_no_client_auth()
        } else {
            builder
                .with_root_certificates(self.root_store())
                .with_no_client_auth()
        };
        Ok(config)
    }

    fn root_store(&self) -> Arc<RootCertStore> {
        match &self.root_cas {
            Some(pool) => Arc::new(pool.root_store().clone()),
            None => Arc::clone(&PLATFORM_ROOTS),
        }
    }

    /// Suites this configuration will offer, after applying provider defaults.
    pub fn effective_cipher_suites(&self) -> Vec<SupportedCipherSuite> {
        self.cipher_suites
            .clone()
            .unwrap_or_else(|| ring::default_provider().cipher_suites)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tls::build_trust_pool;

    const CA_A: &str = include_str!("../../tests/fixtures/ca_a.pem");

    #[test]
    fn test_baseline_is_fixed() {
        let a = secure_baseline();
        let b = secure_baseline();
        assert_eq!(a.min_version, TlsVersion::Tls12);
        assert!(!a.insecure_skip_verify);
        assert!(a.root_cas.is_none());
        assert_eq!(a.cipher_suites, b.cipher_suites);
    }

    #[test]
    fn test_baseline_suites_are_aead_only() {
        for suite in secure_cipher_suites() {
            let name = format!("{:?}", suite.suite());
            assert!(
                name.contains("GCM") || name.contains("CHACHA20_POLY1305"),
                "unexpected suite {}",
                name
            );
        }
    }

    #[test]
    fn test_baseline_resolves() {
        let config = secure_baseline().to_rustls().unwrap();
        assert_eq!(config.crypto_provider().cipher_suites.len(), 9);
    }

    #[test]
    fn test_skip_verify_resolves_with_pool_attached() {
        let mut tls = secure_baseline();
        tls.root_cas = Some(build_trust_pool([CA_A]));
        tls.insecure_skip_verify = true;
        assert!(tls.to_rustls().is_ok());
        assert_eq!(tls.verification_mode(), VerificationMode::NoVerify);
        assert_eq!(tls.root_cas.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_tls13_floor_with_tls12_only_suites_fails() {
        let tls = TlsConfig {
            min_version: TlsVersion::Tls13,
            cipher_suites: Some(vec![
                ring::cipher_suite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
            ]),
            ..TlsConfig::default()
        };
        assert!(matches!(tls.to_rustls(), Err(Error::Tls(_))));
    }

    #[test]
    fn test_default_uses_provider_suites() {
        let suites = TlsConfig::default().effective_cipher_suites();
        assert_eq!(suites, ring::default_provider().cipher_suites);
    }
}
