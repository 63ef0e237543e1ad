//! Key and IV Sizing
//!
//! Derives OpenSSL key/IV lengths from a parsed name alone. The provider is
//! only asked for the largest key its policy allows.

use crate::name::{CipherSpec, Family};
use crate::provider::CipherProvider;

/// Key length used when the name carries no usable size
pub const DEFAULT_KEY_LEN: usize = 16;

/// Key and IV lengths in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyIvLengths {
    pub key_len: usize,
    pub iv_len: usize,
}

impl KeyIvLengths {
    pub fn new(key_len: usize, iv_len: usize) -> Self {
        Self { key_len, iv_len }
    }
}

/// Compute key and IV lengths for a parsed cipher name
///
/// Rules, first match wins:
/// 1. AES/RC2/RC4 with a numeric version: key = version / 8
/// 2. DES: IV 8, key 24 for `EDE3` else 8
/// 3. RC4: IV 0, key 16
/// 4. Anything else: key 16, lowered to the provider's policy maximum
///
/// The IV defaults to 16 for AES and 8 otherwise.
pub fn lengths(spec: &CipherSpec, provider: &dyn CipherProvider) -> KeyIvLengths {
    let family = spec.family();
    let mut iv_len = None;

    let sized_by_version = matches!(family, Family::Aes | Family::Rc2 | Family::Rc4);
    let versioned = if sized_by_version {
        spec.version()
            .and_then(|v| v.parse::<usize>().ok())
            .map(|bits| bits / 8)
    } else {
        None
    };

    let key_len = match versioned {
        Some(key_len) => key_len,
        None => match family {
            Family::Des => {
                iv_len = Some(8);
                let ede3 = spec
                    .version()
                    .map(|v| v.eq_ignore_ascii_case("EDE3"))
                    .unwrap_or(false);
                if ede3 {
                    24
                } else {
                    8
                }
            }
            Family::Rc4 => {
                iv_len = Some(0);
                DEFAULT_KEY_LEN
            }
            _ => match provider.max_allowed_key_bits(spec.transform()) {
                Some(max_bits) => DEFAULT_KEY_LEN.min(max_bits / 8),
                None => DEFAULT_KEY_LEN,
            },
        },
    };

    let iv_len = iv_len.unwrap_or(if family == Family::Aes { 16 } else { 8 });
    KeyIvLengths { key_len, iv_len }
}

/// Key length used for random key generation
///
/// DES keys carry one parity bit per byte, so only 7/8 of the bytes count.
pub fn generate_key_len(spec: &CipherSpec, key_len: usize) -> usize {
    if spec.family() == Family::Des {
        key_len / 8 * 7
    } else {
        key_len
    }
}
