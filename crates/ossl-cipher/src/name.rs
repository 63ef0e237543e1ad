//! Cipher Name Resolution
//!
//! Maps OpenSSL-style cipher names (`AES-256-CBC`, `DES-EDE3`, `bf-cfb`, `RC4`)
//! to provider transform names (`AES/CBC/PKCS5Padding`, `DESede/CBC/...`) and
//! back again.
//!
//! ## Name Grammar
//!
//! ```text
//! BASE                    → mode CBC
//! BASE-MODE               → e.g. BF-ECB
//! BASE-VERSION-MODE[-...] → e.g. AES-256-CFB8, trailing parts ignored
//! ```
//!
//! A mode token that is not a known mode is re-read as the version, so
//! `AES-256` is `AES` / `256` / `CBC`. Parsing never fails: unknown bases are
//! only rejected when a session is created.
//!
//! All token matching goes through the fixed tables below, keyed by the
//! canonical uppercase form of each token.

use std::fmt;

/// Cipher block mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Cbc,
    Cfb,
    Cfb1,
    Cfb8,
    Ecb,
    Ofb,
    Ctr,
    Cts,
    Pcbc,
    None,
    /// Recognized so `AES-128-XTS` keeps its mode, but not a block mode
    Xts,
}

const MODE_TABLE: &[(&str, Mode)] = &[
    ("CBC", Mode::Cbc),
    ("CFB", Mode::Cfb),
    ("CFB1", Mode::Cfb1),
    ("CFB8", Mode::Cfb8),
    ("ECB", Mode::Ecb),
    ("OFB", Mode::Ofb),
    ("CTR", Mode::Ctr),
    ("CTS", Mode::Cts),
    ("PCBC", Mode::Pcbc),
    ("NONE", Mode::None),
    ("XTS", Mode::Xts),
];

impl Mode {
    /// Look up a mode token (case-insensitive)
    pub fn from_token(token: &str) -> Option<Mode> {
        lookup(MODE_TABLE, token)
    }

    /// Canonical token, e.g. `CFB1`
    pub fn as_str(self) -> &'static str {
        MODE_TABLE
            .iter()
            .find(|(_, mode)| *mode == self)
            .map(|(token, _)| *token)
            .unwrap_or("CBC")
    }

    /// Token handed to the provider; 1-bit CFB is addressed as plain `CFB`
    pub fn provider_name(self) -> &'static str {
        match self {
            Mode::Cfb1 => "CFB",
            other => other.as_str(),
        }
    }

    /// Whether this is one of the block modes a name may end in
    pub fn is_block_mode(self) -> bool {
        !matches!(self, Mode::Xts)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Padding scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Padding {
    #[default]
    Pkcs5,
    NoPadding,
    Iso10126,
    Pkcs1,
    Ssl3,
}

const PADDING_TABLE: &[(&str, Padding)] = &[
    ("PKCS5PADDING", Padding::Pkcs5),
    ("NOPADDING", Padding::NoPadding),
    ("0", Padding::NoPadding),
    ("ISO10126PADDING", Padding::Iso10126),
    ("PKCS1PADDING", Padding::Pkcs1),
    ("SSL3PADDING", Padding::Ssl3),
];

impl Padding {
    /// Map a padding token; absent or unknown tokens fall back to PKCS5
    pub fn from_token(token: Option<&str>) -> Padding {
        token
            .and_then(|token| lookup(PADDING_TABLE, token))
            .unwrap_or_default()
    }

    /// Provider spelling, e.g. `PKCS5Padding`
    pub fn provider_name(self) -> &'static str {
        match self {
            Padding::Pkcs5 => "PKCS5Padding",
            Padding::NoPadding => "NoPadding",
            Padding::Iso10126 => "ISO10126Padding",
            Padding::Pkcs1 => "PKCS1Padding",
            Padding::Ssl3 => "SSL3Padding",
        }
    }
}

/// Key-sizing family of a base algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Aes,
    Des,
    Rc2,
    Rc4,
    Other,
}

const FAMILY_TABLE: &[(&str, Family)] = &[
    ("AES", Family::Aes),
    ("DES", Family::Des),
    ("RC2", Family::Rc2),
    ("RC4", Family::Rc4),
];

/// Canonical spelling of known base tokens; `BF` is Blowfish
const BASE_TABLE: &[(&str, &str)] = &[
    ("AES", "AES"),
    ("BF", "Blowfish"),
    ("BLOWFISH", "Blowfish"),
    ("CAMELLIA", "Camellia"),
    ("CAST", "CAST"),
    ("CAST5", "CAST5"),
    ("DES", "DES"),
    ("IDEA", "IDEA"),
    ("RC2", "RC2"),
    ("RC4", "RC4"),
    ("RC5", "RC5"),
    ("SEED", "SEED"),
];

/// Parsed form of an OpenSSL cipher name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CipherSpec {
    base: String,
    version: Option<String>,
    mode: Mode,
    padding: Padding,
    real_name: String,
    transform: String,
}

impl CipherSpec {
    /// Base algorithm, e.g. `AES` or `Blowfish`
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Version token (key bits or DES variant), e.g. `256` or `EDE3`
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn padding(&self) -> Padding {
        self.padding
    }

    /// Provider algorithm, e.g. `DESede` for `DES-EDE3`
    pub fn real_name(&self) -> &str {
        &self.real_name
    }

    /// Full provider transform, e.g. `AES/CBC/PKCS5Padding`
    pub fn transform(&self) -> &str {
        &self.transform
    }

    pub fn family(&self) -> Family {
        lookup(FAMILY_TABLE, &self.base).unwrap_or(Family::Other)
    }

    /// RC4 is keyed without an IV
    pub fn is_rc4(&self) -> bool {
        self.family() == Family::Rc4
    }
}

impl fmt::Display for CipherSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.transform)
    }
}

/// Parse an OpenSSL cipher name with an optional padding token
pub fn parse(name: &str, padding: Option<&str>) -> CipherSpec {
    let mut parts = name.splitn(4, '-');
    let base_token = parts.next().unwrap_or_default();
    let (version_token, mode_token) = match (parts.next(), parts.next()) {
        (None, _) => (None, None),
        (Some(mode), None) => (None, Some(mode)),
        (Some(version), Some(mode)) => (Some(version), Some(mode)),
    };

    let base = lookup(BASE_TABLE, base_token)
        .map(str::to_string)
        .unwrap_or_else(|| base_token.to_string());
    let mut version = version_token.map(str::to_string);
    let mut mode = Mode::Cbc;
    let mut padding = Padding::from_token(padding);

    if let Some(token) = mode_token {
        match Mode::from_token(token) {
            Some(parsed) => mode = parsed,
            None => version = Some(token.to_string()),
        }
    }

    let family = lookup(FAMILY_TABLE, &base).unwrap_or(Family::Other);
    let is_ede3 = version
        .as_deref()
        .map(|v| v.eq_ignore_ascii_case("EDE3"))
        .unwrap_or(false);

    let real_name = if base == "CAST" {
        "CAST5".to_string()
    } else if family == Family::Des && is_ede3 {
        "DESede".to_string()
    } else {
        base.clone()
    };

    let transform = if family == Family::Rc4 {
        mode = Mode::None;
        padding = Padding::NoPadding;
        real_name.clone()
    } else {
        format!(
            "{}/{}/{}",
            real_name,
            mode.provider_name(),
            padding.provider_name()
        )
    };

    CipherSpec {
        base,
        version,
        mode,
        padding,
        real_name,
        transform,
    }
}

/// Map a provider transform name back to `BASE-VERSION-MODE`
///
/// Returns `None` unless the transform has exactly one or three `/` parts.
/// `fallback_key_bits` becomes the version when the transform carries none.
pub fn to_external_name(transform: &str, fallback_key_bits: usize) -> Option<String> {
    let parts: Vec<&str> = transform.split('/').collect();
    if parts.len() != 1 && parts.len() != 3 {
        return None;
    }

    let mut base = parts[0];
    let mut version = None;
    let mut mode = Mode::Cbc;
    if parts.len() == 3 {
        match Mode::from_token(parts[1]).filter(|m| m.is_block_mode()) {
            Some(parsed) => mode = parsed,
            None => version = Some(parts[1].to_string()),
        }
    }

    if base.eq_ignore_ascii_case("DESede") {
        base = "DES";
        version = Some("EDE3".to_string());
    } else if base.eq_ignore_ascii_case("Blowfish") {
        base = "BF";
    }

    let version = version.unwrap_or_else(|| fallback_key_bits.to_string());
    Some(format!("{}-{}-{}", base, version, mode))
}

/// Provider transform for a cipher name, assuming PKCS5 padding
pub fn real_name(name: &str) -> String {
    parse(name, None).transform
}

/// Algorithm part of a transform name (text before the first `/`)
pub fn algorithm_base(transform: &str) -> &str {
    transform.split('/').next().unwrap_or(transform)
}

fn lookup<T: Copy>(table: &[(&str, T)], token: &str) -> Option<T> {
    let canonical = token.to_ascii_uppercase();
    table
        .iter()
        .find(|(key, _)| *key == canonical)
        .map(|(_, value)| *value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_full_name() {
        let spec = parse("AES-256-CBC", None);
        assert_eq!(spec.base(), "AES");
        assert_eq!(spec.version(), Some("256"));
        assert_eq!(spec.mode(), Mode::Cbc);
        assert_eq!(spec.padding(), Padding::Pkcs5);
        assert_eq!(spec.transform(), "AES/CBC/PKCS5Padding");
    }

    #[test]
    fn test_parse_base_only_defaults_to_cbc() {
        let spec = parse("CAST", None);
        assert_eq!(spec.base(), "CAST");
        assert_eq!(spec.version(), None);
        assert_eq!(spec.mode(), Mode::Cbc);
        assert_eq!(spec.real_name(), "CAST5");
        assert_eq!(spec.transform(), "CAST5/CBC/PKCS5Padding");
    }

    #[test]
    fn test_version_demotion() {
        let spec = parse("AES-256", None);
        assert_eq!(spec.version(), Some("256"));
        assert_eq!(spec.mode(), Mode::Cbc);

        let spec = parse("RC4-40", None);
        assert_eq!(spec.version(), Some("40"));
        assert_eq!(spec.transform(), "RC4");

        // Demotion replaces an explicit version
        let spec = parse("AES-1-2", None);
        assert_eq!(spec.version(), Some("2"));
        assert_eq!(spec.mode(), Mode::Cbc);
    }

    #[test]
    fn test_trailing_parts_ignored() {
        let spec = parse("AES-128-CBC-HMAC-SHA1", None);
        assert_eq!(spec.version(), Some("128"));
        assert_eq!(spec.mode(), Mode::Cbc);
        assert_eq!(spec.transform(), "AES/CBC/PKCS5Padding");
    }

    #[test]
    fn test_base_substitutions() {
        let spec = parse("BF-ECB", None);
        assert_eq!(spec.base(), "Blowfish");
        assert_eq!(spec.transform(), "Blowfish/ECB/PKCS5Padding");

        let spec = parse("DES-EDE3-CBC", None);
        assert_eq!(spec.base(), "DES");
        assert_eq!(spec.real_name(), "DESede");
        assert_eq!(spec.transform(), "DESede/CBC/PKCS5Padding");

        let spec = parse("des-ede3", None);
        assert_eq!(spec.version(), Some("ede3"));
        assert_eq!(spec.real_name(), "DESede");

        let spec = parse("DES-EDE-CBC", None);
        assert_eq!(spec.real_name(), "DES");
    }

    #[test]
    fn test_cfb1_collapses_for_provider() {
        let spec = parse("AES-128-CFB1", None);
        assert_eq!(spec.mode(), Mode::Cfb1);
        assert_eq!(spec.transform(), "AES/CFB/PKCS5Padding");

        let spec = parse("AES-128-CFB8", None);
        assert_eq!(spec.transform(), "AES/CFB8/PKCS5Padding");
    }

    #[test]
    fn test_xts_kept_as_mode() {
        let spec = parse("AES-128-XTS", None);
        assert_eq!(spec.version(), Some("128"));
        assert_eq!(spec.mode(), Mode::Xts);
        assert_eq!(spec.transform(), "AES/XTS/PKCS5Padding");
    }

    #[test]
    fn test_rc4_collapses() {
        let spec = parse("RC4", Some("PKCS5Padding"));
        assert_eq!(spec.mode(), Mode::None);
        assert_eq!(spec.padding(), Padding::NoPadding);
        assert_eq!(spec.transform(), "RC4");
        assert!(spec.is_rc4());
    }

    #[test]
    fn test_padding_table() {
        assert_eq!(Padding::from_token(None), Padding::Pkcs5);
        assert_eq!(Padding::from_token(Some("nopadding")), Padding::NoPadding);
        assert_eq!(Padding::from_token(Some("0")), Padding::NoPadding);
        assert_eq!(Padding::from_token(Some("Iso10126Padding")), Padding::Iso10126);
        assert_eq!(Padding::from_token(Some("PKCS1PADDING")), Padding::Pkcs1);
        assert_eq!(Padding::from_token(Some("ssl3padding")), Padding::Ssl3);
        assert_eq!(Padding::from_token(Some("OAEPPadding")), Padding::Pkcs5);

        let spec = parse("AES-128-ECB", Some("0"));
        assert_eq!(spec.transform(), "AES/ECB/NoPadding");
    }

    #[test]
    fn test_lowercase_names_normalize() {
        let spec = parse("aes-128-cbc", None);
        assert_eq!(spec.base(), "AES");
        assert_eq!(spec.mode(), Mode::Cbc);
        assert_eq!(spec.transform(), "AES/CBC/PKCS5Padding");
    }

    #[test]
    fn test_unknown_base_is_kept() {
        let spec = parse("FOO-9-OFB", None);
        assert_eq!(spec.base(), "FOO");
        assert_eq!(spec.family(), Family::Other);
        assert_eq!(spec.transform(), "FOO/OFB/PKCS5Padding");
    }

    #[test]
    fn test_to_external_name() {
        assert_eq!(
            to_external_name("AES/CBC/PKCS5Padding", 128).as_deref(),
            Some("AES-128-CBC")
        );
        assert_eq!(
            to_external_name("DESede/CBC/NoPadding", 192).as_deref(),
            Some("DES-EDE3-CBC")
        );
        assert_eq!(
            to_external_name("Blowfish/OFB/PKCS5Padding", 128).as_deref(),
            Some("BF-128-OFB")
        );
        // Bare name: no mode part, so version from the fallback and CBC
        assert_eq!(to_external_name("RC4", 128).as_deref(), Some("RC4-128-CBC"));
        // Non-mode middle part becomes the version
        assert_eq!(
            to_external_name("AES/XTS/NoPadding", 256).as_deref(),
            Some("AES-XTS-CBC")
        );
        assert_eq!(to_external_name("AES/CBC", 128), None);
        assert_eq!(to_external_name("A/B/C/D", 128), None);
    }

    #[test]
    fn test_cfb1_external_collapse() {
        let spec = parse("AES-128-CFB1", None);
        assert_eq!(
            to_external_name(spec.transform(), 128).as_deref(),
            Some("AES-128-CFB")
        );
    }

    #[test]
    fn test_helpers() {
        assert_eq!(real_name("DES-EDE3-CFB"), "DESede/CFB/PKCS5Padding");
        assert_eq!(algorithm_base("DESede/CFB/PKCS5Padding"), "DESede");
        assert_eq!(algorithm_base("RC4"), "RC4");
    }

    proptest! {
        #[test]
        fn parse_is_total(name in ".*", padding in proptest::option::of(".*")) {
            let spec = parse(&name, padding.as_deref());
            prop_assert!(!spec.transform().is_empty());
            prop_assert_eq!(parse(&name, padding.as_deref()), spec);
        }

        #[test]
        fn numeric_names_round_trip(
            base in prop::sample::select(vec!["AES", "BF", "Camellia", "CAST5", "RC2", "SEED"]),
            bits in prop::sample::select(vec![40usize, 64, 128, 192, 256]),
            mode in prop::sample::select(vec!["CBC", "CFB", "CFB8", "ECB", "OFB", "CTR"]),
        ) {
            let name = format!("{}-{}-{}", base, bits, mode);
            let spec = parse(&name, None);
            prop_assert_eq!(to_external_name(spec.transform(), bits), Some(name));
        }
    }
}
