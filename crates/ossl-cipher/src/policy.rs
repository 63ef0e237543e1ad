use serde::{Deserialize, Serialize};

use crate::error::{CipherError, Result};

/// Environment variable holding a JSON-encoded [`ProviderPolicy`]
pub const POLICY_ENV_VAR: &str = "OSSL_CIPHER_POLICY";

/// Cryptographic policy applied by the bundled provider
///
/// Mirrors a jurisdiction policy file: a ceiling on key strength plus a list
/// of algorithms the deployment refuses to offer.
///
/// ```json
/// { "max_key_bits": 128, "disabled_algorithms": ["RC4", "DES"] }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProviderPolicy {
    /// Largest key in bits any transform may be primed with; `None` = unlimited
    pub max_key_bits: Option<usize>,

    /// Provider algorithm names (case-insensitive) that are never offered
    pub disabled_algorithms: Vec<String>,
}

impl ProviderPolicy {
    /// No key ceiling, nothing disabled
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Cap key strength at `max_key_bits`
    pub fn restricted(max_key_bits: usize) -> Self {
        Self {
            max_key_bits: Some(max_key_bits),
            ..Self::default()
        }
    }

    /// Parse a JSON policy document
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read the policy from `OSSL_CIPHER_POLICY`
    ///
    /// A missing variable yields the unlimited default.
    ///
    /// # Errors
    /// Returns error if the variable is set but not a valid policy document
    pub fn from_env() -> Result<Self> {
        match std::env::var(POLICY_ENV_VAR) {
            Ok(json) => Self::from_json(&json).map_err(|e| {
                CipherError::InvalidConfiguration(format!("Invalid {}: {}", POLICY_ENV_VAR, e))
            }),
            Err(std::env::VarError::NotPresent) => Ok(Self::default()),
            Err(e) => Err(CipherError::InvalidConfiguration(format!(
                "Unreadable {}: {}",
                POLICY_ENV_VAR, e
            ))),
        }
    }

    pub fn is_disabled(&self, algorithm: &str) -> bool {
        self.disabled_algorithms
            .iter()
            .any(|disabled| disabled.eq_ignore_ascii_case(algorithm))
    }

    pub fn permits_key_bits(&self, bits: usize) -> bool {
        self.max_key_bits.map_or(true, |max| bits <= max)
    }
}
