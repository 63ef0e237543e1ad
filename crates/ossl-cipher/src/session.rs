//! Cipher Session
//!
//! A stateful cipher context in the style of `EVP_CIPHER_CTX`: pick a name,
//! set key material and a direction, then stream data through `update` and
//! `finalize`.
//!
//! ## Lifecycle
//!
//! ```text
//! allocate ─initialize─▶ Constructed ─set_key/set_iv─▶ KeyMaterialSet
//!                                                         │ update/finalize (lazy prime)
//!                                                         ▼
//!                         finalize (re-prime) ◀──── Primed(direction) ◀─▶ Streaming
//! ```
//!
//! ## IV Chaining
//!
//! Every `update` with non-empty output remembers the trailing `iv_len` bytes
//! of the ciphertext side (output when encrypting, input when decrypting).
//! After `finalize`, a block cipher with an IV re-primes itself with those
//! bytes, so a further `update`/`finalize` cycle continues the chain instead
//! of restarting from the original IV. `reset`, `encrypt` and `decrypt`
//! return to the original IV. Stream ciphers never chain.

use std::fmt;

use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::error::{CipherError, Result};
use crate::kdf::{derive_key_iv, SALT_LEN};
use crate::name::{parse, CipherSpec, Mode};
use crate::provider::{Direction, Transform};
use crate::registry::{default_engine, Engine};
use crate::size::{generate_key_len, lengths};
use crate::{DEFAULT_DIGEST, DEFAULT_ITERATIONS};

/// IV seed of the deprecated password form of `encrypt`/`decrypt`
const LEGACY_IV_SEED: &[u8] = b"OpenSSL for Ruby rulez!";

type Secret = Zeroizing<Vec<u8>>;

fn secret(bytes: &[u8]) -> Secret {
    Zeroizing::new(bytes.to_vec())
}

struct SessionState {
    name: String,
    spec: CipherSpec,
    key_len: usize,
    iv_len: usize,
    key: Option<Secret>,
    current_iv: Option<Secret>,
    original_iv: Option<Secret>,
    last_chained_iv: Option<Secret>,
    direction: Direction,
    primed: bool,
    transform: Box<dyn Transform>,
}

fn create_transform(engine: &Engine, spec: &CipherSpec) -> Result<Box<dyn Transform>> {
    engine
        .create_transform(spec.transform())
        .map_err(|_| CipherError::unsupported(spec.transform()))
}

impl SessionState {
    fn build(engine: &Engine, name: &str) -> Result<Self> {
        let spec = parse(name, None);
        let sizes = lengths(&spec, engine.cipher_provider());
        let transform = create_transform(engine, &spec)?;
        Ok(Self {
            name: name.to_ascii_uppercase(),
            spec,
            key_len: sizes.key_len,
            iv_len: sizes.iv_len,
            key: None,
            current_iv: None,
            original_iv: None,
            last_chained_iv: None,
            direction: Direction::Encrypt,
            primed: false,
            transform,
        })
    }

    fn is_stream(&self) -> bool {
        self.transform.block_size() == 0
    }

    fn prime(&mut self) -> Result<()> {
        let key = self.key.as_ref().ok_or(CipherError::KeyNotSpecified)?;

        let result = if self.spec.mode() == Mode::Ecb {
            self.transform.init(self.direction, key, None)
        } else {
            let iv_len = self.iv_len;
            let iv = self
                .current_iv
                .get_or_insert_with(|| Zeroizing::new(vec![0u8; iv_len]));
            if self.spec.is_rc4() {
                self.transform.init(self.direction, key, None)
            } else {
                self.transform.init(self.direction, key, Some(iv.as_slice()))
            }
        };
        result.map_err(|err| CipherError::init_failure(self.spec.transform(), err))?;

        self.primed = true;
        debug!(
            cipher = %self.name,
            transform = %self.spec,
            direction = %self.direction,
            key_len = self.key_len,
            iv_len = self.iv_len,
            chained = self.last_chained_iv.is_some(),
            "Cipher primed"
        );
        Ok(())
    }

    fn ensure_primed(&mut self) -> Result<()> {
        if self.primed {
            return Ok(());
        }
        self.prime()
    }

    /// Remember the tail of `source` as the next chaining IV
    fn capture_chain(&mut self, source: &[u8]) {
        if self.current_iv.is_none() {
            return;
        }
        let iv_len = self.iv_len;
        let scratch = self
            .last_chained_iv
            .get_or_insert_with(|| Zeroizing::new(vec![0u8; iv_len]));
        if source.len() >= iv_len {
            scratch.copy_from_slice(&source[source.len() - iv_len..]);
        }
    }
}

/// OpenSSL-compatible symmetric cipher session
///
/// Single owner; the session is `Send` but not meant to be shared.
pub struct CipherSession {
    engine: Engine,
    state: Option<SessionState>,
}

impl CipherSession {
    /// Uninitialized session bound to an engine
    pub fn allocate(engine: &Engine) -> Self {
        Self {
            engine: engine.clone(),
            state: None,
        }
    }

    /// Session for `name` on the process-wide default engine
    pub fn new(name: &str) -> Result<Self> {
        Self::with_engine(default_engine(), name)
    }

    pub fn with_engine(engine: &Engine, name: &str) -> Result<Self> {
        let mut session = Self::allocate(engine);
        session.initialize(name)?;
        Ok(session)
    }

    /// Bind an allocated session to a cipher name
    ///
    /// # Errors
    /// `UnsupportedCipher` when the engine's registry lacks the name,
    /// `AlreadyInitialized` when called twice
    pub fn initialize(&mut self, name: &str) -> Result<()> {
        if !self.engine.is_supported(name) {
            return Err(CipherError::unsupported(name));
        }
        if self.state.is_some() {
            return Err(CipherError::AlreadyInitialized);
        }
        self.state = Some(SessionState::build(&self.engine, name)?);
        Ok(())
    }

    fn state(&self) -> Result<&SessionState> {
        self.state.as_ref().ok_or(CipherError::NotInitialized)
    }

    fn state_mut(&mut self) -> Result<&mut SessionState> {
        self.state.as_mut().ok_or(CipherError::NotInitialized)
    }

    /// Uppercased cipher name, e.g. `AES-256-CBC`
    pub fn name(&self) -> Option<&str> {
        self.state.as_ref().map(|state| state.name.as_str())
    }

    pub fn key_len(&self) -> Option<usize> {
        self.state.as_ref().map(|state| state.key_len)
    }

    pub fn iv_len(&self) -> Option<usize> {
        self.state.as_ref().map(|state| state.iv_len)
    }

    /// Effective key length for random key generation
    pub fn generate_key_len(&self) -> Option<usize> {
        self.state
            .as_ref()
            .map(|state| generate_key_len(&state.spec, state.key_len))
    }

    pub fn spec(&self) -> Option<&CipherSpec> {
        self.state.as_ref().map(|state| &state.spec)
    }

    pub fn direction(&self) -> Option<Direction> {
        self.state.as_ref().map(|state| state.direction)
    }

    /// Provider transform in use, e.g. `AES/CBC/PKCS5Padding`
    pub fn transform_name(&self) -> Option<&str> {
        self.state.as_ref().map(|state| state.transform.algorithm())
    }

    /// Override the expected key length
    pub fn set_key_len(&mut self, key_len: usize) -> Result<()> {
        self.state_mut()?.key_len = key_len;
        Ok(())
    }

    /// Set the key; bytes past `key_len` are ignored
    pub fn set_key(&mut self, key: &[u8]) -> Result<()> {
        let state = self.state_mut()?;
        if key.len() < state.key_len {
            return Err(CipherError::KeyTooShort {
                expected: state.key_len,
                actual: key.len(),
            });
        }
        state.key = Some(secret(&key[..state.key_len]));
        Ok(())
    }

    /// Set both the current and original IV; bytes past `iv_len` are ignored
    pub fn set_iv(&mut self, iv: &[u8]) -> Result<()> {
        let state = self.state_mut()?;
        if iv.len() < state.iv_len {
            return Err(CipherError::IvTooShort {
                expected: state.iv_len,
                actual: iv.len(),
            });
        }
        let iv = secret(&iv[..state.iv_len]);
        state.current_iv = Some(iv.clone());
        state.original_iv = Some(iv);
        if !state.is_stream() {
            state.primed = false;
        }
        Ok(())
    }

    /// Choose a direction and rewind to the original IV
    ///
    /// `legacy_password` selects the deprecated derivation where the key comes
    /// from MD5 `EVP_BytesToKey` salted with a fixed seed, and that seed (or
    /// `legacy_iv`) becomes the IV.
    pub fn select_direction(
        &mut self,
        direction: Direction,
        legacy_password: Option<&[u8]>,
        legacy_iv: Option<&[u8]>,
    ) -> Result<()> {
        let engine = &self.engine;
        let state = self.state.as_mut().ok_or(CipherError::NotInitialized)?;

        state.current_iv = state.original_iv.clone();
        state.direction = direction;
        state.primed = false;

        let Some(password) = legacy_password else {
            return Ok(());
        };

        warn!(
            cipher = %state.name,
            %direction,
            "Key derivation through encrypt/decrypt is deprecated; use pkcs5_keyivgen instead"
        );

        let mut iv = LEGACY_IV_SEED.to_vec();
        iv.resize(state.iv_len, 0);
        if let Some(explicit) = legacy_iv {
            iv = explicit[..explicit.len().min(state.iv_len)].to_vec();
        }
        let iv = Zeroizing::new(iv);

        let mut digest = engine.digest(DEFAULT_DIGEST)?;
        let derived = derive_key_iv(
            state.key_len,
            state.iv_len,
            digest.as_mut(),
            Some(iv.as_slice()),
            Some(password),
            DEFAULT_ITERATIONS,
        );
        state.key = Some(secret(&derived.key));
        state.current_iv = Some(iv.clone());
        state.original_iv = Some(iv);
        Ok(())
    }

    pub fn encrypt(&mut self) -> Result<()> {
        self.select_direction(Direction::Encrypt, None, None)
    }

    pub fn decrypt(&mut self) -> Result<()> {
        self.select_direction(Direction::Decrypt, None, None)
    }

    #[deprecated(note = "use pkcs5_keyivgen to derive key material from a password")]
    pub fn encrypt_with_password(&mut self, password: &[u8], iv: Option<&[u8]>) -> Result<()> {
        self.select_direction(Direction::Encrypt, Some(password), iv)
    }

    #[deprecated(note = "use pkcs5_keyivgen to derive key material from a password")]
    pub fn decrypt_with_password(&mut self, password: &[u8], iv: Option<&[u8]>) -> Result<()> {
        self.select_direction(Direction::Decrypt, Some(password), iv)
    }

    /// Feed data, returning whatever output the provider has ready
    ///
    /// # Errors
    /// `EmptyInput` for empty data, checked before anything else
    pub fn update(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        if data.is_empty() {
            return Err(CipherError::EmptyInput);
        }
        let state = self.state_mut()?;
        state.ensure_primed()?;

        let output = state
            .transform
            .update(data)
            .map_err(|err| CipherError::operation_failure(state.spec.transform(), "update", err))?;

        // Decryption chains from the ciphertext fed in, even while a padded
        // final block is still held back
        if state.direction.is_encrypt() {
            state.capture_chain(&output);
        } else {
            state.capture_chain(data);
        }
        Ok(output)
    }

    /// Flush buffered data and padding
    ///
    /// Block ciphers with an IV re-prime with the chained IV afterwards and
    /// stay usable. Stream ciphers return nothing and keep their keystream
    /// position.
    pub fn finalize(&mut self) -> Result<Vec<u8>> {
        let state = self.state_mut()?;
        state.ensure_primed()?;
        if state.is_stream() {
            return Ok(Vec::new());
        }

        let output = state
            .transform
            .finalize()
            .map_err(|err| CipherError::operation_failure(state.spec.transform(), "finalize", err))?;

        if state.current_iv.is_some() {
            state.capture_chain(&output);
            state.current_iv = state.last_chained_iv.clone();
            state.prime()?;
        }
        Ok(output)
    }

    /// Re-prime with the original IV (block ciphers only)
    pub fn reset(&mut self) -> Result<()> {
        let state = self.state_mut()?;
        if !state.is_stream() {
            state.current_iv = state.original_iv.clone();
            state.prime()?;
        }
        Ok(())
    }

    /// Switch padding; rebuilds the transform but keeps key and IV
    pub fn set_padding(&mut self, padding: &str) -> Result<()> {
        let engine = &self.engine;
        let state = self.state.as_mut().ok_or(CipherError::NotInitialized)?;

        let spec = parse(&state.name, Some(padding));
        let sizes = lengths(&spec, engine.cipher_provider());
        state.transform = create_transform(engine, &spec)?;
        state.spec = spec;
        state.key_len = sizes.key_len;
        state.iv_len = sizes.iv_len;
        state.primed = false;
        Ok(())
    }

    /// `1` for stream ciphers, otherwise the provider block size
    pub fn block_size(&self) -> Result<usize> {
        let state = self.state()?;
        if state.is_stream() {
            Ok(1)
        } else {
            Ok(state.transform.block_size())
        }
    }

    /// Derive key and IV from a password with `EVP_BytesToKey`, then prime
    ///
    /// Defaults: 2048 iterations, MD5.
    ///
    /// # Errors
    /// `InvalidSaltLength` unless the salt is absent or exactly 8 bytes,
    /// `UnsupportedDigest` for an unknown digest name
    pub fn pkcs5_keyivgen(
        &mut self,
        password: &[u8],
        salt: Option<&[u8]>,
        iterations: Option<usize>,
        digest: Option<&str>,
    ) -> Result<()> {
        if let Some(salt) = salt {
            if salt.len() != SALT_LEN {
                return Err(CipherError::InvalidSaltLength(salt.len()));
            }
        }

        let engine = &self.engine;
        let state = self.state.as_mut().ok_or(CipherError::NotInitialized)?;
        let mut digest = engine.digest(digest.unwrap_or(DEFAULT_DIGEST))?;
        let derived = derive_key_iv(
            state.key_len,
            state.iv_len,
            digest.as_mut(),
            salt,
            Some(password),
            iterations.unwrap_or(DEFAULT_ITERATIONS),
        );

        state.key = Some(secret(&derived.key));
        state.current_iv = Some(secret(&derived.iv));
        state.original_iv = Some(secret(&derived.iv));
        state.prime()
    }

    /// Copy name, lengths, direction, key and IV into an un-primed session
    /// with its own transform
    pub fn try_clone(&self) -> Result<Self> {
        let state = self.state()?;
        let transform = create_transform(&self.engine, &state.spec)?;
        Ok(Self {
            engine: self.engine.clone(),
            state: Some(SessionState {
                name: state.name.clone(),
                spec: state.spec.clone(),
                key_len: state.key_len,
                iv_len: state.iv_len,
                key: state.key.clone(),
                current_iv: state.current_iv.clone(),
                original_iv: state.current_iv.clone(),
                last_chained_iv: None,
                direction: state.direction,
                primed: false,
                transform,
            }),
        })
    }
}

impl fmt::Debug for CipherSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("CipherSession");
        match &self.state {
            Some(state) => debug
                .field("name", &state.name)
                .field("transform", &state.spec.transform())
                .field("direction", &state.direction)
                .field("primed", &state.primed)
                .field("key", &state.key.as_ref().map(|_| "[REDACTED]"))
                .field("iv", &state.current_iv.as_ref().map(|_| "[REDACTED]")),
            None => debug.field("initialized", &false),
        };
        debug.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RustCryptoProvider;
    use crate::policy::ProviderPolicy;
    use crate::provider::ProviderError;
    use tracing_test::traced_test;

    const KEY: &[u8] = b"0123456789abcdef0123456789abcdef";
    const IV: &[u8] = b"fedcba9876543210";

    fn engine() -> Engine {
        Engine::from_provider(RustCryptoProvider::default())
    }

    fn session(name: &str) -> CipherSession {
        let mut session = CipherSession::with_engine(&engine(), name).unwrap();
        let key_len = session.key_len().unwrap();
        let iv_len = session.iv_len().unwrap();
        session.set_key(&KEY[..key_len]).unwrap();
        session.set_iv(&IV[..iv_len]).unwrap();
        session
    }

    fn seal(session: &mut CipherSession, data: &[u8]) -> Vec<u8> {
        let mut out = session.update(data).unwrap();
        out.extend(session.finalize().unwrap());
        out
    }

    #[test]
    fn test_lifecycle_errors() {
        let engine = engine();
        let mut session = CipherSession::allocate(&engine);
        assert!(session.name().is_none());
        assert!(matches!(session.update(b"x"), Err(CipherError::NotInitialized)));
        assert!(matches!(session.finalize(), Err(CipherError::NotInitialized)));
        assert!(matches!(session.block_size(), Err(CipherError::NotInitialized)));

        assert!(matches!(
            session.initialize("NOPE-128-CBC"),
            Err(CipherError::UnsupportedCipher { .. })
        ));
        session.initialize("aes-128-cbc").unwrap();
        assert_eq!(session.name(), Some("AES-128-CBC"));
        assert!(matches!(
            session.initialize("AES-128-CBC"),
            Err(CipherError::AlreadyInitialized)
        ));
        // Unsupported names are reported before the double initialization
        assert!(matches!(
            session.initialize("SEED-CBC"),
            Err(CipherError::UnsupportedCipher { .. })
        ));
    }

    #[test]
    fn test_empty_update_rejected_in_every_state() {
        let engine = engine();
        let mut session = CipherSession::allocate(&engine);
        assert!(matches!(session.update(b""), Err(CipherError::EmptyInput)));

        let mut session = self::session("AES-128-CBC");
        assert!(matches!(session.update(b""), Err(CipherError::EmptyInput)));
        session.update(b"data").unwrap();
        assert!(matches!(session.update(b""), Err(CipherError::EmptyInput)));
    }

    #[test]
    fn test_key_length_rules() {
        let mut session = CipherSession::with_engine(&engine(), "AES-128-CBC").unwrap();
        assert!(matches!(
            session.set_key(&[1u8; 10]),
            Err(CipherError::KeyTooShort {
                expected: 16,
                actual: 10
            })
        ));

        // Long keys are truncated
        session.set_key(&KEY[..20]).unwrap();
        session.set_iv(IV).unwrap();
        let long = seal(&mut session, b"payload");

        let mut exact = self::session("AES-128-CBC");
        assert_eq!(seal(&mut exact, b"payload"), long);
    }

    #[test]
    fn test_iv_length_rules() {
        let mut session = CipherSession::with_engine(&engine(), "DES-EDE3-CBC").unwrap();
        assert!(matches!(
            session.set_iv(&[0u8; 4]),
            Err(CipherError::IvTooShort {
                expected: 8,
                actual: 4
            })
        ));
        session.set_key(&KEY[..24]).unwrap();
        session.set_iv(IV).unwrap();
        let truncated = seal(&mut session, b"payload");

        let mut exact = self::session("DES-EDE3-CBC");
        assert_eq!(seal(&mut exact, b"payload"), truncated);
    }

    #[test]
    fn test_missing_key() {
        let mut session = CipherSession::with_engine(&engine(), "AES-128-CBC").unwrap();
        assert!(matches!(session.update(b"x"), Err(CipherError::KeyNotSpecified)));
        assert!(matches!(session.reset(), Err(CipherError::KeyNotSpecified)));
    }

    #[test]
    fn test_missing_iv_is_zero_filled() {
        let mut implicit = CipherSession::with_engine(&engine(), "AES-128-CBC").unwrap();
        implicit.set_key(&KEY[..16]).unwrap();
        let implicit_out = seal(&mut implicit, b"no iv given");

        let mut explicit = CipherSession::with_engine(&engine(), "AES-128-CBC").unwrap();
        explicit.set_key(&KEY[..16]).unwrap();
        explicit.set_iv(&[0u8; 16]).unwrap();
        assert_eq!(seal(&mut explicit, b"no iv given"), implicit_out);
    }

    #[test]
    fn test_finalize_chains_iv() {
        let first_message = b"first message, longer than a block";
        let mut session = self::session("AES-128-CBC");
        let first = seal(&mut session, first_message);
        let second = seal(&mut session, b"second");

        // The second message continues from the last ciphertext block
        let mut fresh = self::session("AES-128-CBC");
        fresh.set_iv(&first[first.len() - 16..]).unwrap();
        assert_eq!(seal(&mut fresh, b"second"), second);

        // A decrypting session follows the same chain
        let mut reader = self::session("AES-128-CBC");
        reader.decrypt().unwrap();
        assert_eq!(seal(&mut reader, &first), first_message.to_vec());
        assert_eq!(seal(&mut reader, &second), b"second".to_vec());
    }

    #[test]
    fn test_reset_and_direction_restore_original_iv() {
        let mut session = self::session("BF-CBC");
        let first = seal(&mut session, b"same input");

        session.reset().unwrap();
        assert_eq!(seal(&mut session, b"same input"), first);

        session.encrypt().unwrap();
        assert_eq!(seal(&mut session, b"same input"), first);
    }

    #[test]
    fn test_double_finalize_is_deterministic() {
        let run = || {
            let mut session = self::session("AES-256-CBC");
            session.update(b"some data").unwrap();
            let first = session.finalize().unwrap();
            let second = session.finalize().unwrap();
            (first, second)
        };
        let (first, second) = run();
        assert_eq!(first.len(), 16);
        assert_eq!(second.len(), 16);
        assert_ne!(first, second);
        assert_eq!(run(), (first, second));
    }

    #[test]
    fn test_ecb_without_iv_does_not_chain() {
        let mut session = CipherSession::with_engine(&engine(), "AES-128-ECB").unwrap();
        session.set_key(&KEY[..16]).unwrap();
        let first = seal(&mut session, b"ecb block");
        let second = seal(&mut session, b"ecb block");
        assert_eq!(first, second);
    }

    #[test]
    fn test_stream_cipher_behavior() {
        let mut session = self::session("RC4");
        assert_eq!(session.block_size().unwrap(), 1);
        assert_eq!(session.iv_len(), Some(0));

        let first = session.update(b"stream").unwrap();
        assert!(session.finalize().unwrap().is_empty());
        // The keystream carries on after finalize
        let second = session.update(b"stream").unwrap();
        assert_ne!(first, second);

        // reset is a no-op for stream ciphers
        session.reset().unwrap();
        let third = session.update(b"stream").unwrap();
        assert_ne!(third, first);

        let mut reader = self::session("RC4");
        reader.decrypt().unwrap();
        assert_eq!(reader.update(&first).unwrap(), b"stream".to_vec());
    }

    #[test]
    fn test_single_block_messages_chain_when_decrypting() {
        let mut writer = self::session("AES-128-CBC");
        let first = seal(&mut writer, b"hi");
        let second = seal(&mut writer, b"yo");
        assert_eq!(first.len(), 16);

        let mut reader = self::session("AES-128-CBC");
        reader.decrypt().unwrap();
        // The only block is held back, yet it still seeds the chain
        assert!(reader.update(&first).unwrap().is_empty());
        assert_eq!(reader.finalize().unwrap(), b"hi".to_vec());
        assert_eq!(seal(&mut reader, &second), b"yo".to_vec());
    }

    #[test]
    fn test_set_iv_keeps_stream_position() {
        let mut continuous = self::session("RC4");
        let expected = continuous.update(b"keystream continues").unwrap();

        let mut session = self::session("RC4");
        let mut out = session.update(b"keystream ").unwrap();
        session.set_iv(b"").unwrap();
        out.extend(session.update(b"continues").unwrap());
        assert_eq!(out, expected);
    }

    #[test]
    fn test_block_size() {
        assert_eq!(self::session("AES-128-CBC").block_size().unwrap(), 16);
        assert_eq!(self::session("DES-CBC").block_size().unwrap(), 8);
    }

    #[test]
    fn test_set_padding() {
        let mut session = self::session("AES-128-CBC");
        session.set_padding("NoPadding").unwrap();
        assert_eq!(session.transform_name(), Some("AES/CBC/NoPadding"));
        let out = seal(&mut session, &[7u8; 32]);
        assert_eq!(out.len(), 32);

        session.update(&[7u8; 5]).unwrap();
        assert!(matches!(
            session.finalize(),
            Err(CipherError::ProviderOperationFailure {
                operation: "finalize",
                source: ProviderError::IllegalBlockSize(5),
                ..
            })
        ));

        session.set_padding("0").unwrap();
        assert_eq!(session.spec().map(|s| s.transform()), Some("AES/CBC/NoPadding"));
        session.set_padding("PKCS5Padding").unwrap();
        assert_eq!(seal(&mut session, &[7u8; 32]).len(), 48);
    }

    #[test]
    fn test_pkcs5_keyivgen() {
        let mut session = CipherSession::with_engine(&engine(), "AES-256-CBC").unwrap();
        assert!(matches!(
            session.pkcs5_keyivgen(b"secret", Some(b"salt"), None, None),
            Err(CipherError::InvalidSaltLength(4))
        ));
        assert!(matches!(
            session.pkcs5_keyivgen(b"secret", None, None, Some("MD4")),
            Err(CipherError::UnsupportedDigest(_))
        ));

        let salt = b"8bytes!!";
        session
            .pkcs5_keyivgen(b"secret", Some(salt), Some(1000), Some("SHA256"))
            .unwrap();
        let sealed = seal(&mut session, b"derived key material");

        // Same derivation by hand
        let mut digest = engine().digest("SHA256").unwrap();
        let derived = derive_key_iv(32, 16, digest.as_mut(), Some(salt), Some(b"secret"), 1000);
        let mut manual = CipherSession::with_engine(&engine(), "AES-256-CBC").unwrap();
        manual.set_key(&derived.key).unwrap();
        manual.set_iv(&derived.iv).unwrap();
        assert_eq!(seal(&mut manual, b"derived key material"), sealed);
    }

    #[test]
    #[allow(deprecated)]
    fn test_legacy_password_derivation() {
        let mut session = CipherSession::with_engine(&engine(), "AES-128-CBC").unwrap();
        session.encrypt_with_password(b"hunter2", None).unwrap();
        let sealed = seal(&mut session, b"legacy");

        // Key from MD5 x2048 salted with the seed; the seed is also the IV
        let seed = &LEGACY_IV_SEED[..16];
        let mut digest = engine().digest("MD5").unwrap();
        let derived = derive_key_iv(16, 16, digest.as_mut(), Some(seed), Some(b"hunter2"), 2048);
        let mut manual = CipherSession::with_engine(&engine(), "AES-128-CBC").unwrap();
        manual.set_key(&derived.key).unwrap();
        manual.set_iv(seed).unwrap();
        assert_eq!(seal(&mut manual, b"legacy"), sealed);

        let mut reader = CipherSession::with_engine(&engine(), "AES-128-CBC").unwrap();
        reader.decrypt_with_password(b"hunter2", None).unwrap();
        assert_eq!(seal(&mut reader, &sealed), b"legacy".to_vec());
    }

    #[traced_test]
    #[test]
    #[allow(deprecated)]
    fn test_legacy_password_warns() {
        let mut session = CipherSession::with_engine(&engine(), "BF-CBC").unwrap();
        session.decrypt_with_password(b"pw", None).unwrap();
        assert!(logs_contain("deprecated; use pkcs5_keyivgen"));

        session.encrypt().unwrap();
        assert_eq!(session.direction(), Some(Direction::Encrypt));
    }

    #[test]
    #[allow(deprecated)]
    fn test_legacy_explicit_iv_truncated() {
        let mut session = CipherSession::with_engine(&engine(), "DES-CBC").unwrap();
        session
            .encrypt_with_password(b"pw", Some(b"0123456789"))
            .unwrap();
        let sealed = seal(&mut session, b"legacy");

        let mut same = CipherSession::with_engine(&engine(), "DES-CBC").unwrap();
        same.encrypt_with_password(b"pw", Some(b"01234567")).unwrap();
        assert_eq!(seal(&mut same, b"legacy"), sealed);
    }

    #[test]
    fn test_try_clone() {
        let mut session = self::session("AES-128-CBC");
        session.update(b"partial").unwrap();

        let mut copy = session.try_clone().unwrap();
        let mut reference = self::session("AES-128-CBC");
        assert_eq!(seal(&mut copy, b"fresh"), seal(&mut reference, b"fresh"));
        assert_eq!(copy.name(), session.name());

        let engine = engine();
        assert!(matches!(
            CipherSession::allocate(&engine).try_clone(),
            Err(CipherError::NotInitialized)
        ));
    }

    #[test]
    fn test_accessors() {
        let session = CipherSession::with_engine(&engine(), "des-ede3-cbc").unwrap();
        assert_eq!(session.name(), Some("DES-EDE3-CBC"));
        assert_eq!(session.key_len(), Some(24));
        assert_eq!(session.iv_len(), Some(8));
        assert_eq!(session.generate_key_len(), Some(21));
        assert_eq!(session.direction(), Some(Direction::Encrypt));
        assert_eq!(session.transform_name(), Some("DESede/CBC/PKCS5Padding"));

        let mut session = CipherSession::with_engine(&engine(), "RC4").unwrap();
        session.set_key_len(5).unwrap();
        session.set_key(&KEY[..5]).unwrap();
        assert!(session.update(b"short key").is_ok());
    }

    #[test]
    fn test_policy_failure_carries_hint() {
        let engine = Engine::from_provider(RustCryptoProvider::new(ProviderPolicy::restricted(128)));
        let mut session = CipherSession::with_engine(&engine, "AES-256-CBC").unwrap();
        session.set_key(KEY).unwrap();
        let err = session.update(b"too strong").unwrap_err();
        assert!(matches!(err, CipherError::ProviderInitFailure { .. }));
        assert!(err.to_string().contains("jurisdiction policy"));
    }

    #[test]
    fn test_camellia_iv_mismatch_fails_priming() {
        // Camellia gets the generic 8-byte IV but has a 16-byte block
        let mut session = self::session("CAMELLIA-128-CBC");
        assert!(matches!(
            session.update(b"x"),
            Err(CipherError::ProviderInitFailure {
                source: ProviderError::InvalidIv(_),
                ..
            })
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let session = self::session("AES-128-CBC");
        let debug = format!("{:?}", session);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("0123456789abcdef"));
    }
}
