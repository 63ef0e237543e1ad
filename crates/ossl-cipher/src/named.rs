//! Named cipher shortcuts (`AES`, `BF`, `AES256`, ...)

use std::fmt;

use crate::error::Result;
use crate::registry::Engine;
use crate::session::CipherSession;

/// Base identifiers a session can be built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedCipher {
    Aes,
    Cast5,
    Bf,
    Des,
    Idea,
    Rc2,
    Rc4,
    Rc5,
    Aes128,
    Aes192,
    Aes256,
}

impl NamedCipher {
    pub const ALL: [NamedCipher; 11] = [
        NamedCipher::Aes,
        NamedCipher::Cast5,
        NamedCipher::Bf,
        NamedCipher::Des,
        NamedCipher::Idea,
        NamedCipher::Rc2,
        NamedCipher::Rc4,
        NamedCipher::Rc5,
        NamedCipher::Aes128,
        NamedCipher::Aes192,
        NamedCipher::Aes256,
    ];

    pub fn identifier(self) -> &'static str {
        match self {
            NamedCipher::Aes => "AES",
            NamedCipher::Cast5 => "CAST5",
            NamedCipher::Bf => "BF",
            NamedCipher::Des => "DES",
            NamedCipher::Idea => "IDEA",
            NamedCipher::Rc2 => "RC2",
            NamedCipher::Rc4 => "RC4",
            NamedCipher::Rc5 => "RC5",
            NamedCipher::Aes128 => "AES128",
            NamedCipher::Aes192 => "AES192",
            NamedCipher::Aes256 => "AES256",
        }
    }

    pub fn from_identifier(identifier: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|named| named.identifier().eq_ignore_ascii_case(identifier))
    }

    fn aes_key_bits(self) -> Option<u16> {
        match self {
            NamedCipher::Aes128 => Some(128),
            NamedCipher::Aes192 => Some(192),
            NamedCipher::Aes256 => Some(256),
            _ => None,
        }
    }

    /// Full cipher name for this identifier and its arguments
    ///
    /// Plain identifiers join their arguments with `-`, so `Aes` with
    /// `["128", "CFB"]` gives `AES-128-CFB`. The `AesN` shortcuts only take a
    /// mode (default `CBC`) and give `AES-N-<mode>`.
    pub fn cipher_name(self, args: &[&str]) -> String {
        match self.aes_key_bits() {
            Some(bits) => {
                let mode = args.first().copied().unwrap_or("CBC");
                format!("AES-{}-{}", bits, mode)
            }
            None => args
                .iter()
                .fold(self.identifier().to_string(), |name, arg| {
                    format!("{}-{}", name, arg)
                }),
        }
    }

    /// Session on the default engine
    pub fn session(self, args: &[&str]) -> Result<CipherSession> {
        CipherSession::new(&self.cipher_name(args))
    }

    pub fn session_with_engine(self, engine: &Engine, args: &[&str]) -> Result<CipherSession> {
        CipherSession::with_engine(engine, &self.cipher_name(args))
    }
}

impl fmt::Display for NamedCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}
