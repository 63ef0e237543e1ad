//! RustCrypto Provider
//!
//! Default [`CipherProvider`] and [`DigestProvider`] built on RustCrypto block
//! and stream primitives. Chaining comes from the RustCrypto mode crates and
//! padding from `block-padding`; this module only buffers input so that whole
//! blocks reach them, holding back the last block while decrypting.
//!
//! ## Supported Transforms
//!
//! | Algorithm | Keys (bytes) | Block |
//! |-----------|--------------|-------|
//! | AES       | 16, 24, 32   | 16    |
//! | Camellia  | 16, 24, 32   | 16    |
//! | DES       | 8            | 8     |
//! | DESede    | 16, 24       | 8     |
//! | RC2       | 1..=128      | 8     |
//! | Blowfish  | 4..=56       | 8     |
//! | CAST5     | 5..=16       | 8     |
//! | RC4       | 5, 7, 8, 10, 16, 24, 32 | stream |
//!
//! Modes: ECB, CBC, PCBC, CFB (full block), CFB8, OFB, CTR.
//! Paddings: PKCS5Padding, ISO10126Padding, NoPadding. Padding only applies
//! to ECB, CBC and PCBC; the feedback modes emit output byte for byte.

use std::sync::Arc;

use aes::{Aes128, Aes192, Aes256};
use block_padding::{Iso10126, Padding, Pkcs7};
use blowfish::Blowfish;
use camellia::{Camellia128, Camellia192, Camellia256};
use cast5::Cast5;
use cipher::consts::{U10, U16, U24, U256, U32, U5, U7, U8};
use cipher::generic_array::{ArrayLength, GenericArray};
use cipher::typenum::{IsLess, Le, NonZero, Unsigned};
use cipher::{
    BlockCipher, BlockDecryptMut, BlockEncryptMut, BlockSizeUser, InnerIvInit, InvalidLength,
    KeyInit, StreamCipher, StreamCipherCoreWrapper,
};
use ctr::flavors::{Ctr128BE, Ctr64BE};
use ctr::CtrCore;
use des::{Des, TdesEde2, TdesEde3};
use digest::DynDigest;
use rand::Rng;
use rc2::Rc2;
use rc4::Rc4;
use tracing::debug;
use zeroize::Zeroizing;

use crate::name::algorithm_base;
use crate::policy::ProviderPolicy;
use crate::provider::{
    CipherProvider, DigestProvider, Direction, MessageDigest, ProviderError, Transform,
    TransformService,
};

const PROVIDER_NAME: &str = "RustCrypto";

const BLOCK_MODES: &str = "ECB|CBC|PCBC|CFB|CFB8|OFB|CTR";
const STREAM_MODES: &str = "ECB|NONE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Algorithm {
    Aes,
    Camellia,
    Des,
    DesEde,
    Rc2,
    Blowfish,
    Cast5,
    Rc4,
}

const ALGORITHMS: &[Algorithm] = &[
    Algorithm::Aes,
    Algorithm::Camellia,
    Algorithm::Des,
    Algorithm::DesEde,
    Algorithm::Rc2,
    Algorithm::Blowfish,
    Algorithm::Cast5,
    Algorithm::Rc4,
];

const ALGORITHM_TABLE: &[(&str, Algorithm)] = &[
    ("AES", Algorithm::Aes),
    ("CAMELLIA", Algorithm::Camellia),
    ("DES", Algorithm::Des),
    ("DESEDE", Algorithm::DesEde),
    ("TRIPLEDES", Algorithm::DesEde),
    ("RC2", Algorithm::Rc2),
    ("BLOWFISH", Algorithm::Blowfish),
    ("CAST5", Algorithm::Cast5),
    ("RC4", Algorithm::Rc4),
    ("ARCFOUR", Algorithm::Rc4),
];

impl Algorithm {
    fn from_name(name: &str) -> Option<Self> {
        let canonical = name.to_ascii_uppercase();
        ALGORITHM_TABLE
            .iter()
            .find(|(key, _)| *key == canonical)
            .map(|(_, algorithm)| *algorithm)
    }

    fn canonical(self) -> &'static str {
        match self {
            Algorithm::Aes => "AES",
            Algorithm::Camellia => "Camellia",
            Algorithm::Des => "DES",
            Algorithm::DesEde => "DESede",
            Algorithm::Rc2 => "RC2",
            Algorithm::Blowfish => "Blowfish",
            Algorithm::Cast5 => "CAST5",
            Algorithm::Rc4 => "RC4",
        }
    }

    fn block_size(self) -> usize {
        match self {
            Algorithm::Aes | Algorithm::Camellia => 16,
            Algorithm::Rc4 => 0,
            _ => 8,
        }
    }

    fn is_stream(self) -> bool {
        self.block_size() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChainMode {
    Ecb,
    Cbc,
    Pcbc,
    Cfb,
    Cfb8,
    Ofb,
    Ctr,
}

const CHAIN_MODE_TABLE: &[(&str, ChainMode)] = &[
    ("ECB", ChainMode::Ecb),
    ("CBC", ChainMode::Cbc),
    ("PCBC", ChainMode::Pcbc),
    ("CFB", ChainMode::Cfb),
    ("CFB8", ChainMode::Cfb8),
    ("OFB", ChainMode::Ofb),
    ("CTR", ChainMode::Ctr),
];

impl ChainMode {
    fn from_name(name: &str) -> Option<Self> {
        let canonical = name.to_ascii_uppercase();
        CHAIN_MODE_TABLE
            .iter()
            .find(|(key, _)| *key == canonical)
            .map(|(_, mode)| *mode)
    }

    /// Feedback modes turn the block cipher into a keystream
    fn is_feedback(self) -> bool {
        matches!(
            self,
            ChainMode::Cfb | ChainMode::Cfb8 | ChainMode::Ofb | ChainMode::Ctr
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PaddingScheme {
    Pkcs5,
    Iso10126,
    NoPadding,
}

impl PaddingScheme {
    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "PKCS5PADDING" | "PKCS7PADDING" => Some(PaddingScheme::Pkcs5),
            "ISO10126PADDING" => Some(PaddingScheme::Iso10126),
            "NOPADDING" => Some(PaddingScheme::NoPadding),
            _ => None,
        }
    }

    fn is_padded(self) -> bool {
        !matches!(self, PaddingScheme::NoPadding)
    }

    /// Complete the trailing partial block (a full block when aligned)
    fn pad(self, buf: &mut Vec<u8>, block_size: usize) {
        if block_size == 16 {
            self.pad_block::<U16>(buf);
        } else {
            self.pad_block::<U8>(buf);
        }
    }

    fn pad_block<B: ArrayLength<u8>>(self, buf: &mut Vec<u8>) {
        let pos = buf.len() % B::USIZE;
        let start = buf.len() - pos;
        let mut block = GenericArray::<u8, B>::default();
        block[..pos].copy_from_slice(&buf[start..]);
        match self {
            PaddingScheme::Pkcs5 => <Pkcs7 as Padding<B>>::pad(&mut block, pos),
            PaddingScheme::Iso10126 => {
                <Iso10126 as Padding<B>>::pad(&mut block, pos);
                // Filler is random; only the final count byte is fixed
                rand::rng().fill(&mut block[pos..B::USIZE - 1]);
            }
            PaddingScheme::NoPadding => return,
        }
        buf.truncate(start);
        buf.extend_from_slice(&block);
    }

    /// Strip padding from the final decrypted block
    fn unpad(self, buf: &mut Vec<u8>, block_size: usize) -> std::result::Result<(), ProviderError> {
        if block_size == 16 {
            self.unpad_block::<U16>(buf)
        } else {
            self.unpad_block::<U8>(buf)
        }
    }

    fn unpad_block<B: ArrayLength<u8>>(
        self,
        buf: &mut Vec<u8>,
    ) -> std::result::Result<(), ProviderError> {
        let start = buf
            .len()
            .checked_sub(B::USIZE)
            .ok_or(ProviderError::BadPadding)?;
        let block = GenericArray::<u8, B>::from_slice(&buf[start..]);
        let kept = match self {
            PaddingScheme::Pkcs5 => <Pkcs7 as Padding<B>>::unpad(block),
            PaddingScheme::Iso10126 => <Iso10126 as Padding<B>>::unpad(block),
            PaddingScheme::NoPadding => return Ok(()),
        }
        .map_err(|_| ProviderError::BadPadding)?
        .len();
        buf.truncate(start + kept);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Stream,
    Block {
        mode: ChainMode,
        padding: PaddingScheme,
    },
}

/// Object-safe view of a keyed chaining mode
///
/// ECB, CBC and PCBC are fed whole blocks; the feedback modes take any length.
trait ModeCipher: Send {
    fn apply(&mut self, buf: &mut [u8]);
}

struct Encrypting<M>(M);

struct Decrypting<M>(M);

struct Keystream<S>(S);

impl<M: BlockEncryptMut + Send> ModeCipher for Encrypting<M> {
    fn apply(&mut self, buf: &mut [u8]) {
        for block in buf.chunks_exact_mut(M::block_size()) {
            self.0.encrypt_block_mut(GenericArray::from_mut_slice(block));
        }
    }
}

impl<M: BlockDecryptMut + Send> ModeCipher for Decrypting<M> {
    fn apply(&mut self, buf: &mut [u8]) {
        for block in buf.chunks_exact_mut(M::block_size()) {
            self.0.decrypt_block_mut(GenericArray::from_mut_slice(block));
        }
    }
}

impl<S: StreamCipher + Send> ModeCipher for Keystream<S> {
    fn apply(&mut self, buf: &mut [u8]) {
        self.0.apply_keystream(buf);
    }
}

impl<C> ModeCipher for cfb_mode::BufEncryptor<C>
where
    C: BlockEncryptMut + BlockCipher + Send,
{
    fn apply(&mut self, buf: &mut [u8]) {
        self.encrypt(buf);
    }
}

impl<C> ModeCipher for cfb_mode::BufDecryptor<C>
where
    C: BlockEncryptMut + BlockCipher + Send,
{
    fn apply(&mut self, buf: &mut [u8]) {
        self.decrypt(buf);
    }
}

/// CTR over the whole block as a big-endian counter
type CounterInit<C> = fn(C, &[u8]) -> std::result::Result<Box<dyn ModeCipher>, InvalidLength>;

fn wide_counter<C>(cipher: C, iv: &[u8]) -> std::result::Result<Box<dyn ModeCipher>, InvalidLength>
where
    C: BlockEncryptMut + BlockCipher + BlockSizeUser<BlockSize = U16> + Send + 'static,
{
    let core = CtrCore::<C, Ctr128BE>::inner_iv_slice_init(cipher, iv)?;
    Ok(Box::new(Keystream(StreamCipherCoreWrapper::from_core(core))))
}

fn narrow_counter<C>(cipher: C, iv: &[u8]) -> std::result::Result<Box<dyn ModeCipher>, InvalidLength>
where
    C: BlockEncryptMut + BlockCipher + BlockSizeUser<BlockSize = U8> + Send + 'static,
{
    let core = CtrCore::<C, Ctr64BE>::inner_iv_slice_init(cipher, iv)?;
    Ok(Box::new(Keystream(StreamCipherCoreWrapper::from_core(core))))
}

/// Wrap a keyed primitive in the requested mode; ECB ignores `iv`
fn chain<C>(
    cipher: C,
    mode: ChainMode,
    direction: Direction,
    iv: Option<&[u8]>,
    counter: CounterInit<C>,
) -> std::result::Result<Box<dyn ModeCipher>, InvalidLength>
where
    C: BlockCipher + BlockEncryptMut + BlockDecryptMut + Send + 'static,
    C::BlockSize: IsLess<U256>,
    Le<C::BlockSize, U256>: NonZero,
{
    let iv = iv.unwrap_or_default();
    let built: Box<dyn ModeCipher> = match (mode, direction) {
        (ChainMode::Ecb, Direction::Encrypt) => Box::new(Encrypting(cipher)),
        (ChainMode::Ecb, Direction::Decrypt) => Box::new(Decrypting(cipher)),
        (ChainMode::Cbc, Direction::Encrypt) => {
            Box::new(Encrypting(cbc::Encryptor::inner_iv_slice_init(cipher, iv)?))
        }
        (ChainMode::Cbc, Direction::Decrypt) => {
            Box::new(Decrypting(cbc::Decryptor::inner_iv_slice_init(cipher, iv)?))
        }
        (ChainMode::Pcbc, Direction::Encrypt) => {
            Box::new(Encrypting(pcbc::Encryptor::inner_iv_slice_init(cipher, iv)?))
        }
        (ChainMode::Pcbc, Direction::Decrypt) => {
            Box::new(Decrypting(pcbc::Decryptor::inner_iv_slice_init(cipher, iv)?))
        }
        (ChainMode::Cfb, Direction::Encrypt) => {
            Box::new(cfb_mode::BufEncryptor::inner_iv_slice_init(cipher, iv)?)
        }
        (ChainMode::Cfb, Direction::Decrypt) => {
            Box::new(cfb_mode::BufDecryptor::inner_iv_slice_init(cipher, iv)?)
        }
        (ChainMode::Cfb8, Direction::Encrypt) => {
            Box::new(Encrypting(cfb8::Encryptor::inner_iv_slice_init(cipher, iv)?))
        }
        (ChainMode::Cfb8, Direction::Decrypt) => {
            Box::new(Decrypting(cfb8::Decryptor::inner_iv_slice_init(cipher, iv)?))
        }
        (ChainMode::Ofb, _) => {
            let core = ofb::OfbCore::inner_iv_slice_init(cipher, iv)?;
            Box::new(Keystream(StreamCipherCoreWrapper::from_core(core)))
        }
        (ChainMode::Ctr, _) => counter(cipher, iv)?,
    };
    Ok(built)
}

fn invalid_key(algorithm: Algorithm, len: usize) -> ProviderError {
    ProviderError::InvalidKey(format!(
        "{} bytes is not a valid {} key length",
        len,
        algorithm.canonical()
    ))
}

fn keyed<C: KeyInit>(algorithm: Algorithm, key: &[u8]) -> std::result::Result<C, ProviderError> {
    C::new_from_slice(key).map_err(|_| invalid_key(algorithm, key.len()))
}

fn build_chain(
    algorithm: Algorithm,
    mode: ChainMode,
    direction: Direction,
    key: &[u8],
    iv: Option<&[u8]>,
) -> std::result::Result<Box<dyn ModeCipher>, ProviderError> {
    let built = match (algorithm, key.len()) {
        (Algorithm::Aes, 16) => {
            chain(keyed::<Aes128>(algorithm, key)?, mode, direction, iv, wide_counter)
        }
        (Algorithm::Aes, 24) => {
            chain(keyed::<Aes192>(algorithm, key)?, mode, direction, iv, wide_counter)
        }
        (Algorithm::Aes, 32) => {
            chain(keyed::<Aes256>(algorithm, key)?, mode, direction, iv, wide_counter)
        }
        (Algorithm::Camellia, 16) => {
            chain(keyed::<Camellia128>(algorithm, key)?, mode, direction, iv, wide_counter)
        }
        (Algorithm::Camellia, 24) => {
            chain(keyed::<Camellia192>(algorithm, key)?, mode, direction, iv, wide_counter)
        }
        (Algorithm::Camellia, 32) => {
            chain(keyed::<Camellia256>(algorithm, key)?, mode, direction, iv, wide_counter)
        }
        (Algorithm::Des, 8) => {
            chain(keyed::<Des>(algorithm, key)?, mode, direction, iv, narrow_counter)
        }
        (Algorithm::DesEde, 16) => {
            chain(keyed::<TdesEde2>(algorithm, key)?, mode, direction, iv, narrow_counter)
        }
        (Algorithm::DesEde, 24) => {
            chain(keyed::<TdesEde3>(algorithm, key)?, mode, direction, iv, narrow_counter)
        }
        (Algorithm::Rc2, 1..=128) => {
            let rc2 = Rc2::new_with_eff_key_len(key, key.len() * 8);
            chain(rc2, mode, direction, iv, narrow_counter)
        }
        (Algorithm::Blowfish, _) => {
            chain(keyed::<Blowfish>(algorithm, key)?, mode, direction, iv, narrow_counter)
        }
        (Algorithm::Cast5, _) => {
            chain(keyed::<Cast5>(algorithm, key)?, mode, direction, iv, narrow_counter)
        }
        _ => return Err(invalid_key(algorithm, key.len())),
    };
    built.map_err(|_| {
        ProviderError::InvalidIv(format!("expected {} bytes", algorithm.block_size()))
    })
}

fn new_stream<C>(key: &[u8]) -> std::result::Result<Box<dyn StreamCipher + Send>, ProviderError>
where
    C: KeyInit + StreamCipher + Send + 'static,
{
    C::new_from_slice(key)
        .map(|c| Box::new(c) as Box<dyn StreamCipher + Send>)
        .map_err(|_| invalid_key(Algorithm::Rc4, key.len()))
}

fn build_rc4(key: &[u8]) -> std::result::Result<Box<dyn StreamCipher + Send>, ProviderError> {
    match key.len() {
        5 => new_stream::<Rc4<U5>>(key),
        7 => new_stream::<Rc4<U7>>(key),
        8 => new_stream::<Rc4<U8>>(key),
        10 => new_stream::<Rc4<U10>>(key),
        16 => new_stream::<Rc4<U16>>(key),
        24 => new_stream::<Rc4<U24>>(key),
        32 => new_stream::<Rc4<U32>>(key),
        len => Err(invalid_key(Algorithm::Rc4, len)),
    }
}

/// Buffering in front of a block mode
struct BlockState {
    mode: ChainMode,
    padding: PaddingScheme,
    block_size: usize,
    chain: Box<dyn ModeCipher>,
    /// Input waiting for a full block (ECB/CBC/PCBC only)
    pending: Vec<u8>,
}

impl BlockState {
    fn update(&mut self, direction: Direction, data: &[u8]) -> Vec<u8> {
        if self.mode.is_feedback() {
            let mut out = data.to_vec();
            self.chain.apply(&mut out);
            return out;
        }

        self.pending.extend_from_slice(data);
        let block_size = self.block_size;
        let total = self.pending.len();
        // Decrypting with padding holds back the final block until finalize
        let ready = if direction == Direction::Decrypt && self.padding.is_padded() {
            total.saturating_sub(1) / block_size * block_size
        } else {
            total / block_size * block_size
        };

        let mut chunk: Vec<u8> = self.pending.drain(..ready).collect();
        self.chain.apply(&mut chunk);
        chunk
    }

    fn finish(&mut self, direction: Direction) -> std::result::Result<Vec<u8>, ProviderError> {
        if self.mode.is_feedback() {
            return Ok(Vec::new());
        }

        let block_size = self.block_size;
        let mut tail = std::mem::take(&mut self.pending);
        match direction {
            Direction::Encrypt => {
                if self.padding.is_padded() {
                    self.padding.pad(&mut tail, block_size);
                } else if tail.len() % block_size != 0 {
                    return Err(ProviderError::IllegalBlockSize(tail.len()));
                }
                self.chain.apply(&mut tail);
                Ok(tail)
            }
            Direction::Decrypt => {
                if tail.len() % block_size != 0 {
                    return Err(ProviderError::IllegalBlockSize(tail.len()));
                }
                if tail.is_empty() {
                    return Ok(tail);
                }
                self.chain.apply(&mut tail);
                self.padding.unpad(&mut tail, block_size)?;
                Ok(tail)
            }
        }
    }
}

enum Running {
    Stream(Box<dyn StreamCipher + Send>),
    Block(BlockState),
}

fn start(
    algorithm: Algorithm,
    layout: Layout,
    direction: Direction,
    key: &[u8],
    iv: Option<&[u8]>,
) -> std::result::Result<Running, ProviderError> {
    match layout {
        Layout::Stream => Ok(Running::Stream(build_rc4(key)?)),
        Layout::Block { mode, padding } => Ok(Running::Block(BlockState {
            mode,
            padding,
            block_size: algorithm.block_size(),
            chain: build_chain(algorithm, mode, direction, key, iv)?,
            pending: Vec::new(),
        })),
    }
}

struct Primed {
    direction: Direction,
    key: Zeroizing<Vec<u8>>,
    iv: Option<Vec<u8>>,
    running: Running,
}

impl Primed {
    /// Return to the state right after `init`
    fn rewind(&mut self, algorithm: Algorithm, layout: Layout) -> std::result::Result<(), ProviderError> {
        self.running = start(algorithm, layout, self.direction, &self.key, self.iv.as_deref())?;
        debug!(algorithm = algorithm.canonical(), "transform rewound");
        Ok(())
    }
}

/// A transform produced by [`RustCryptoProvider`]
pub struct RustCryptoTransform {
    name: String,
    algorithm: Algorithm,
    layout: Layout,
    policy: Arc<ProviderPolicy>,
    primed: Option<Primed>,
}

impl std::fmt::Debug for RustCryptoTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RustCryptoTransform")
            .field("name", &self.name)
            .field("layout", &self.layout)
            .field("primed", &self.primed.is_some())
            .finish()
    }
}

impl Transform for RustCryptoTransform {
    fn algorithm(&self) -> &str {
        &self.name
    }

    fn block_size(&self) -> usize {
        self.algorithm.block_size()
    }

    fn init(
        &mut self,
        direction: Direction,
        key: &[u8],
        iv: Option<&[u8]>,
    ) -> std::result::Result<(), ProviderError> {
        let requested = key.len() * 8;
        if !self.policy.permits_key_bits(requested) {
            return Err(ProviderError::PolicyRestricted {
                requested,
                allowed: self.policy.max_key_bits.unwrap_or(requested),
            });
        }

        let iv = match self.layout {
            Layout::Block { mode, .. } if mode != ChainMode::Ecb => {
                let iv = iv.ok_or_else(|| {
                    ProviderError::InvalidIv(format!("{} requires an iv", self.name))
                })?;
                let block_size = self.algorithm.block_size();
                if iv.len() != block_size {
                    return Err(ProviderError::InvalidIv(format!(
                        "expected {} bytes, got {}",
                        block_size,
                        iv.len()
                    )));
                }
                Some(iv.to_vec())
            }
            _ => None,
        };
        let running = start(self.algorithm, self.layout, direction, key, iv.as_deref())?;

        self.primed = Some(Primed {
            direction,
            key: Zeroizing::new(key.to_vec()),
            iv,
            running,
        });
        debug!(transform = %self.name, %direction, "transform primed");
        Ok(())
    }

    fn update(&mut self, data: &[u8]) -> std::result::Result<Vec<u8>, ProviderError> {
        let primed = self.primed.as_mut().ok_or(ProviderError::IllegalState)?;
        match &mut primed.running {
            Running::Stream(cipher) => {
                let mut buf = data.to_vec();
                cipher.apply_keystream(&mut buf);
                Ok(buf)
            }
            Running::Block(state) => Ok(state.update(primed.direction, data)),
        }
    }

    fn finalize(&mut self) -> std::result::Result<Vec<u8>, ProviderError> {
        let (algorithm, layout) = (self.algorithm, self.layout);
        let primed = self.primed.as_mut().ok_or(ProviderError::IllegalState)?;
        let output = match &mut primed.running {
            Running::Stream(_) => Ok(Vec::new()),
            Running::Block(state) => state.finish(primed.direction),
        };
        primed.rewind(algorithm, layout)?;
        output
    }
}

/// Bundled provider over RustCrypto primitives and digests
#[derive(Debug, Clone, Default)]
pub struct RustCryptoProvider {
    policy: Arc<ProviderPolicy>,
}

impl RustCryptoProvider {
    pub fn new(policy: ProviderPolicy) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }

    pub fn policy(&self) -> &ProviderPolicy {
        &self.policy
    }

    fn parse_transform(&self, transform: &str) -> std::result::Result<(Algorithm, Layout), ProviderError> {
        let unsupported = || ProviderError::NotSupported(transform.to_string());
        let parts: Vec<&str> = transform.split('/').collect();
        let (algorithm, mode, padding) = match parts.as_slice() {
            [algorithm] => (*algorithm, None, None),
            [algorithm, mode, padding] => (*algorithm, Some(*mode), Some(*padding)),
            _ => return Err(unsupported()),
        };

        let algorithm = Algorithm::from_name(algorithm).ok_or_else(unsupported)?;
        if self.policy.is_disabled(algorithm.canonical()) {
            return Err(unsupported());
        }

        if algorithm.is_stream() {
            let mode_ok = mode.map_or(true, |m| {
                m.eq_ignore_ascii_case("NONE") || m.eq_ignore_ascii_case("ECB")
            });
            let padding_ok = padding.map_or(true, |p| p.eq_ignore_ascii_case("NoPadding"));
            if !(mode_ok && padding_ok) {
                return Err(unsupported());
            }
            return Ok((algorithm, Layout::Stream));
        }

        let mode = match mode {
            Some(mode) => ChainMode::from_name(mode).ok_or_else(unsupported)?,
            None => ChainMode::Ecb,
        };
        let padding = match padding {
            Some(padding) => PaddingScheme::from_name(padding).ok_or_else(unsupported)?,
            None => PaddingScheme::Pkcs5,
        };
        Ok((algorithm, Layout::Block { mode, padding }))
    }
}

impl CipherProvider for RustCryptoProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn list_cipher_transforms(&self) -> Vec<TransformService> {
        ALGORITHMS
            .iter()
            .filter(|algorithm| !self.policy.is_disabled(algorithm.canonical()))
            .map(|algorithm| {
                let modes = if algorithm.is_stream() {
                    STREAM_MODES
                } else {
                    BLOCK_MODES
                };
                TransformService::new(algorithm.canonical(), Some(modes))
            })
            .collect()
    }

    fn create_transform(
        &self,
        transform: &str,
    ) -> std::result::Result<Box<dyn Transform>, ProviderError> {
        let (algorithm, layout) = self.parse_transform(transform)?;
        Ok(Box::new(RustCryptoTransform {
            name: transform.to_string(),
            algorithm,
            layout,
            policy: Arc::clone(&self.policy),
            primed: None,
        }))
    }

    fn max_allowed_key_bits(&self, transform: &str) -> Option<usize> {
        Algorithm::from_name(algorithm_base(transform))?;
        Some(self.policy.max_key_bits.unwrap_or(usize::MAX))
    }
}

struct DynMessageDigest(Box<dyn DynDigest + Send>);

impl MessageDigest for DynMessageDigest {
    fn reset(&mut self) {
        self.0.reset();
    }

    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(&mut self) -> Vec<u8> {
        self.0.finalize_reset().into_vec()
    }
}

impl DigestProvider for RustCryptoProvider {
    fn digest(&self, algorithm: &str) -> Option<Box<dyn MessageDigest>> {
        let canonical = algorithm.to_ascii_uppercase().replace('-', "");
        let inner: Box<dyn DynDigest + Send> = match canonical.as_str() {
            "MD5" => Box::new(md5::Md5::default()),
            "SHA1" => Box::new(sha1::Sha1::default()),
            "SHA224" => Box::new(sha2::Sha224::default()),
            "SHA256" => Box::new(sha2::Sha256::default()),
            "SHA384" => Box::new(sha2::Sha384::default()),
            "SHA512" => Box::new(sha2::Sha512::default()),
            _ => return None,
        };
        Some(Box::new(DynMessageDigest(inner)))
    }
}
