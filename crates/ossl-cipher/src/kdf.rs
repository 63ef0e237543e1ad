//! Legacy Key Derivation (EVP_BytesToKey)
//!
//! OpenSSL's original password-to-key scheme:
//!
//! ```text
//! D_0 = empty
//! D_i = H^count(D_{i-1} || password || salt[0..8])
//! key || iv = D_1 || D_2 || ...
//! ```
//!
//! where `H^count` is `count` chained digest applications. Each block fills
//! the remaining key bytes first, then the remaining IV bytes.
//!
//! This is not a modern KDF; it exists for compatibility with data produced
//! by `openssl enc` and `Cipher#pkcs5_keyivgen`.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::provider::MessageDigest;

/// Salt bytes consumed per round
pub const SALT_LEN: usize = 8;

/// Derived key and IV, zeroized on drop
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct KeyIv {
    pub key: Vec<u8>,
    pub iv: Vec<u8>,
}

impl std::fmt::Debug for KeyIv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyIv")
            .field("key", &"[REDACTED]")
            .field("key_len", &self.key.len())
            .field("iv_len", &self.iv.len())
            .finish()
    }
}

/// Derive `key_len` key bytes and `iv_len` IV bytes from a password
///
/// An absent or empty password yields zero-filled buffers without running the
/// digest. A salt shorter than [`SALT_LEN`] is treated as no salt; longer
/// salts contribute only their first eight bytes. `iterations` below one
/// behaves like one.
pub fn derive_key_iv(
    key_len: usize,
    iv_len: usize,
    digest: &mut dyn MessageDigest,
    salt: Option<&[u8]>,
    password: Option<&[u8]>,
    iterations: usize,
) -> KeyIv {
    let mut out = KeyIv {
        key: vec![0u8; key_len],
        iv: vec![0u8; iv_len],
    };

    let password = match password {
        Some(password) if !password.is_empty() => password,
        _ => return out,
    };
    let salt = salt.filter(|s| s.len() >= SALT_LEN).map(|s| &s[..SALT_LEN]);

    let mut key_ix = 0usize;
    let mut iv_ix = 0usize;
    let mut block: Vec<u8> = Vec::new();
    let mut first_round = true;

    while key_ix < key_len || iv_ix < iv_len {
        digest.reset();
        if !first_round {
            digest.update(&block);
        }
        first_round = false;
        digest.update(password);
        if let Some(salt) = salt {
            digest.update(salt);
        }
        block.zeroize();
        block = digest.finalize();

        for _ in 1..iterations {
            digest.reset();
            digest.update(&block);
            let next = digest.finalize();
            block.zeroize();
            block = next;
        }

        if block.is_empty() {
            // A zero-length digest can never fill the buffers
            break;
        }

        let mut consumed = 0usize;
        while key_ix < key_len && consumed < block.len() {
            out.key[key_ix] = block[consumed];
            key_ix += 1;
            consumed += 1;
        }
        while iv_ix < iv_len && consumed < block.len() {
            out.iv[iv_ix] = block[consumed];
            iv_ix += 1;
            consumed += 1;
        }
    }

    block.zeroize();
    out
}
