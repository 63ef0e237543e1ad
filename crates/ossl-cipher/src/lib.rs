//! # OpenSSL-Compatible Cipher Sessions
//!
//! Symmetric cipher sessions that follow OpenSSL's naming, key/IV sizing and
//! legacy `EVP_BytesToKey` derivation, while the block and stream transforms
//! themselves come from a pluggable provider.
//!
//! ## Features
//!
//! - **Name resolution**: `AES-256-CBC`, `DES-EDE3`, `bf-cfb`, `RC4` mapped to
//!   provider transforms such as `AES/CBC/PKCS5Padding` and back
//! - **Key/IV sizing**: derived from the name alone, clamped by provider policy
//! - **Legacy KDF**: byte-exact `EVP_BytesToKey` over any provider digest
//! - **Sessions**: `update`/`finalize` with OpenSSL-style IV chaining
//! - **Bundled provider**: RustCrypto primitives with ECB, CBC, PCBC, CFB,
//!   CFB8, OFB and CTR modes
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use ossl_cipher::CipherSession;
//!
//! let mut cipher = CipherSession::new("AES-128-CBC")?;
//! cipher.encrypt()?;
//! cipher.pkcs5_keyivgen(b"password", Some(b"saltsalt"), None, None)?;
//!
//! let mut sealed = cipher.update(b"attack at dawn")?;
//! sealed.extend(cipher.finalize()?);
//! ```
//!
//! ## Configuration
//!
//! The default engine reads a JSON [`ProviderPolicy`] from the
//! `OSSL_CIPHER_POLICY` environment variable once per process:
//!
//! ```json
//! { "max_key_bits": 128, "disabled_algorithms": ["RC4"] }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! CipherSession ──▶ name / size / kdf
//!       │
//!       ▼
//!    Engine ──▶ CipherRegistry (probed once)
//!       │
//!       ▼
//! CipherProvider + DigestProvider  (RustCryptoProvider by default)
//! ```

// Module declarations
pub mod backend;
pub mod error;
pub mod kdf;
pub mod name;
pub mod named;
pub mod policy;
pub mod provider;
pub mod registry;
pub mod session;
pub mod size;

// Re-exports for convenience
pub use backend::RustCryptoProvider;
pub use error::{CipherError, Result};
pub use kdf::{derive_key_iv, KeyIv, SALT_LEN};
pub use name::{parse, to_external_name, CipherSpec, Mode, Padding};
pub use named::NamedCipher;
pub use policy::{ProviderPolicy, POLICY_ENV_VAR};
pub use provider::{
    CipherProvider, DigestProvider, Direction, MessageDigest, ProviderError, Transform,
    TransformService,
};
pub use registry::{default_engine, CipherRegistry, Engine};
pub use session::CipherSession;
pub use size::{lengths, KeyIvLengths};

// Version information
/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Iteration count used by `pkcs5_keyivgen` and the legacy password path
pub const DEFAULT_ITERATIONS: usize = 2048;

/// Digest used by `pkcs5_keyivgen` when none is named
pub const DEFAULT_DIGEST: &str = "MD5";

/// Supported cipher names from the default engine, each followed by its
/// lowercase spelling
pub fn ciphers() -> Vec<String> {
    default_engine().registry().names_with_lowercase()
}
