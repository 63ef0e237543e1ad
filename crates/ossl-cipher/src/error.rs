use thiserror::Error;

use crate::provider::ProviderError;

/// Cipher session errors
///
/// Raised synchronously at the point where a precondition is violated.
/// Messages never include key or IV bytes.
#[derive(Error, Debug)]
pub enum CipherError {
    /// Lifecycle errors
    #[error("unsupported cipher algorithm ({name})")]
    UnsupportedCipher { name: String },

    #[error("cipher already initialized")]
    AlreadyInitialized,

    #[error("cipher not initialized")]
    NotInitialized,

    /// Key material errors
    #[error("key length too short: expected {expected}, got {actual}")]
    KeyTooShort { expected: usize, actual: usize },

    #[error("iv length too short: expected {expected}, got {actual}")]
    IvTooShort { expected: usize, actual: usize },

    #[error("salt must be an 8-octet string, got {0} bytes")]
    InvalidSaltLength(usize),

    #[error("key not specified")]
    KeyNotSpecified,

    /// Streaming errors
    #[error("data must not be empty")]
    EmptyInput,

    /// Provider errors
    #[error("failed to initialize {transform}: {source}")]
    ProviderInitFailure {
        transform: String,
        #[source]
        source: ProviderError,
    },

    #[error("{operation} failed for {transform}: {source}")]
    ProviderOperationFailure {
        transform: String,
        operation: &'static str,
        #[source]
        source: ProviderError,
    },

    #[error("unsupported digest algorithm ({0})")]
    UnsupportedDigest(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl CipherError {
    pub fn unsupported(name: impl Into<String>) -> Self {
        CipherError::UnsupportedCipher { name: name.into() }
    }

    pub fn init_failure(transform: impl Into<String>, source: ProviderError) -> Self {
        CipherError::ProviderInitFailure {
            transform: transform.into(),
            source,
        }
    }

    pub fn operation_failure(
        transform: impl Into<String>,
        operation: &'static str,
        source: ProviderError,
    ) -> Self {
        CipherError::ProviderOperationFailure {
            transform: transform.into(),
            operation,
            source,
        }
    }
}

/// Result type alias for cipher operations
pub type Result<T> = std::result::Result<T, CipherError>;
