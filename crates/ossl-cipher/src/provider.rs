//! Provider Interfaces
//!
//! The session layer never touches a primitive directly. Everything it needs
//! from a cryptographic backend goes through the traits in this module:
//!
//! - [`CipherProvider`]: transform discovery, creation and key-length policy
//! - [`Transform`]: one live cipher instance (init / update / finalize)
//! - [`DigestProvider`] and [`MessageDigest`]: digests for the legacy KDF
//!
//! Transform names follow the `ALGORITHM/MODE/PADDING` convention, e.g.
//! `AES/CBC/PKCS5Padding`, or a bare algorithm such as `RC4`.

use std::fmt;

use thiserror::Error;

/// Cipher direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Encrypt,
    Decrypt,
}

impl Direction {
    pub fn is_encrypt(self) -> bool {
        matches!(self, Direction::Encrypt)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Encrypt => f.write_str("encrypt"),
            Direction::Decrypt => f.write_str("decrypt"),
        }
    }
}

/// A cipher service advertised by a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformService {
    /// Algorithm name, e.g. `AES` or `DESede`
    pub algorithm: String,
    /// `|`-separated mode list, e.g. `ECB|CBC|CFB8`; `None` when unknown
    pub supported_modes: Option<String>,
}

impl TransformService {
    pub fn new(algorithm: impl Into<String>, supported_modes: Option<&str>) -> Self {
        Self {
            algorithm: algorithm.into(),
            supported_modes: supported_modes.map(str::to_string),
        }
    }

    /// Whether the advertised mode list names `mode` (case-insensitive)
    pub fn advertises_mode(&self, mode: &str) -> bool {
        self.supported_modes
            .as_deref()
            .map(|modes| modes.split('|').any(|m| m.trim().eq_ignore_ascii_case(mode)))
            .unwrap_or(false)
    }
}

/// Errors reported by a provider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("transform not supported: {0}")]
    NotSupported(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error(
        "key of {requested} bits exceeds the {allowed}-bit limit: possibly the jurisdiction policy forbids this key strength"
    )]
    PolicyRestricted { requested: usize, allowed: usize },

    #[error("invalid iv: {0}")]
    InvalidIv(String),

    #[error("transform not initialized")]
    IllegalState,

    #[error("bad decrypt: invalid padding")]
    BadPadding,

    #[error("input length {0} is not a multiple of the block size")]
    IllegalBlockSize(usize),
}

/// One live cipher transform, exclusively owned by its caller
pub trait Transform: Send {
    /// Provider transform name this instance was created for
    fn algorithm(&self) -> &str;

    /// Block size in bytes; `0` for stream ciphers
    fn block_size(&self) -> usize;

    /// Prime with key material for a direction, discarding any buffered data
    fn init(
        &mut self,
        direction: Direction,
        key: &[u8],
        iv: Option<&[u8]>,
    ) -> Result<(), ProviderError>;

    /// Feed data; returns whatever output is available
    fn update(&mut self, data: &[u8]) -> Result<Vec<u8>, ProviderError>;

    /// Flush buffered data (padding as configured) and return to the primed state
    fn finalize(&mut self) -> Result<Vec<u8>, ProviderError>;
}

/// Source of cipher transforms
pub trait CipherProvider: Send + Sync {
    /// Human-readable provider name (for logging)
    fn name(&self) -> &str;

    /// Cipher services this provider advertises
    fn list_cipher_transforms(&self) -> Vec<TransformService>;

    /// Create an un-primed transform for a provider transform name
    fn create_transform(&self, transform: &str) -> Result<Box<dyn Transform>, ProviderError>;

    /// Largest key (in bits) policy allows for a transform; `None` when unknown
    fn max_allowed_key_bits(&self, transform: &str) -> Option<usize>;
}

/// Incremental message digest
pub trait MessageDigest: Send {
    fn reset(&mut self);
    fn update(&mut self, data: &[u8]);
    /// Produce the digest and reset
    fn finalize(&mut self) -> Vec<u8>;
}

/// Source of message digests
pub trait DigestProvider: Send + Sync {
    /// Digest by name (`MD5`, `SHA1`, `SHA256`, ...); `None` when unknown
    fn digest(&self, algorithm: &str) -> Option<Box<dyn MessageDigest>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advertises_mode() {
        let service = TransformService::new("AES", Some("ECB|CBC|PCBC|CFB8"));
        assert!(service.advertises_mode("cbc"));
        assert!(service.advertises_mode("CFB8"));
        assert!(!service.advertises_mode("CFB"));

        let bare = TransformService::new("RC4", None);
        assert!(!bare.advertises_mode("CBC"));
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(Direction::Encrypt.to_string(), "encrypt");
        assert_eq!(Direction::Decrypt.to_string(), "decrypt");
        assert!(Direction::default().is_encrypt());
    }
}
