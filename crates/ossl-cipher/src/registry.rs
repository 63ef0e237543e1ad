//! Supported Cipher Registry
//!
//! The set of OpenSSL cipher names a provider can serve is computed once per
//! [`Engine`] by probing a fixed candidate list, then kept for the life of the
//! engine. The process-wide [`default_engine`] is itself initialized once.

use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::{debug, info, instrument, warn};

use crate::backend::RustCryptoProvider;
use crate::error::{CipherError, Result};
use crate::name::{parse, Mode};
use crate::policy::ProviderPolicy;
use crate::provider::{CipherProvider, DigestProvider, MessageDigest, Transform, TransformService};

const PROBE_BASES: &[&str] = &[
    "AES-128",
    "AES-192",
    "AES-256",
    "BF",
    "DES",
    "DES-EDE",
    "DES-EDE3",
    "RC2",
    "CAST5",
    "Camellia-128",
    "Camellia-192",
    "Camellia-256",
    "SEED",
];

const PROBE_SUFFIXES: &[&str] = &["", "-CBC", "-CFB", "-CFB1", "-CFB8", "-ECB", "-OFB"];

const PROBE_EXTRAS: &[&str] = &[
    "AES128",
    "AES192",
    "AES256",
    "BLOWFISH",
    "RC2-40-CBC",
    "RC2-64-CBC",
    "RC4",
    "RC4-40",
    "CAST",
    "CAST-CBC",
];

/// Uppercased cipher names a provider supports, in probe order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CipherRegistry {
    names: Vec<String>,
}

impl CipherRegistry {
    /// Probe every candidate name against a provider
    ///
    /// A name is kept when an advertised service matches its base algorithm
    /// and lists its mode. Otherwise creating the transform decides.
    #[instrument(skip(provider), fields(provider = provider.name()))]
    pub fn probe(provider: &dyn CipherProvider) -> Self {
        let services = provider.list_cipher_transforms();
        let candidates = PROBE_BASES
            .iter()
            .flat_map(|base| PROBE_SUFFIXES.iter().map(move |suffix| format!("{base}{suffix}")))
            .chain(PROBE_EXTRAS.iter().map(|name| name.to_string()));

        let mut names: Vec<String> = Vec::new();
        for candidate in candidates {
            if !is_supported(&candidate, &services, provider) {
                debug!(cipher = %candidate, "cipher not offered by provider");
                continue;
            }
            let upper = candidate.to_ascii_uppercase();
            if !names.contains(&upper) {
                names.push(upper);
            }
        }

        info!(count = names.len(), "Cipher registry built");
        Self { names }
    }

    /// Case-insensitive membership
    pub fn contains(&self, name: &str) -> bool {
        let upper = name.to_ascii_uppercase();
        self.names.iter().any(|known| *known == upper)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Each name followed by its lowercase spelling
    pub fn names_with_lowercase(&self) -> Vec<String> {
        self.names
            .iter()
            .flat_map(|name| [name.clone(), name.to_ascii_lowercase()])
            .collect()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn is_supported(name: &str, services: &[TransformService], provider: &dyn CipherProvider) -> bool {
    let spec = parse(name, None);
    let advertised = services
        .iter()
        .filter(|service| service.algorithm.eq_ignore_ascii_case(spec.base()))
        .any(|service| spec.mode() == Mode::None || service.advertises_mode(spec.mode().as_str()));

    advertised || provider.create_transform(spec.transform()).is_ok()
}

struct EngineInner {
    ciphers: Arc<dyn CipherProvider>,
    digests: Arc<dyn DigestProvider>,
    registry: OnceLock<CipherRegistry>,
}

/// Providers plus the lazily probed registry, shared by every session
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    pub fn new(ciphers: Arc<dyn CipherProvider>, digests: Arc<dyn DigestProvider>) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                ciphers,
                digests,
                registry: OnceLock::new(),
            }),
        }
    }

    /// Engine over one provider serving both ciphers and digests
    pub fn from_provider<P>(provider: P) -> Self
    where
        P: CipherProvider + DigestProvider + 'static,
    {
        let provider = Arc::new(provider);
        Self::new(provider.clone(), provider)
    }

    pub fn cipher_provider(&self) -> &dyn CipherProvider {
        self.inner.ciphers.as_ref()
    }

    /// Registry of supported names, probed on first use
    pub fn registry(&self) -> &CipherRegistry {
        self.inner
            .registry
            .get_or_init(|| CipherRegistry::probe(self.inner.ciphers.as_ref()))
    }

    pub fn is_supported(&self, name: &str) -> bool {
        self.registry().contains(name)
    }

    pub fn create_transform(&self, transform: &str) -> Result<Box<dyn Transform>> {
        Ok(self.inner.ciphers.create_transform(transform)?)
    }

    pub fn digest(&self, algorithm: &str) -> Result<Box<dyn MessageDigest>> {
        self.inner
            .digests
            .digest(algorithm)
            .ok_or_else(|| CipherError::UnsupportedDigest(algorithm.to_string()))
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("provider", &self.inner.ciphers.name())
            .field("registry_built", &self.inner.registry.get().is_some())
            .finish()
    }
}

static DEFAULT_ENGINE: OnceLock<Engine> = OnceLock::new();

/// Process-wide engine over [`RustCryptoProvider`]
///
/// The policy is read from `OSSL_CIPHER_POLICY` on first use; an invalid
/// document falls back to the unlimited default.
pub fn default_engine() -> &'static Engine {
    DEFAULT_ENGINE.get_or_init(|| {
        let policy = ProviderPolicy::from_env().unwrap_or_else(|err| {
            warn!(error = %err, "Ignoring cipher policy from environment");
            ProviderPolicy::default()
        });
        Engine::from_provider(RustCryptoProvider::new(policy))
    })
}
