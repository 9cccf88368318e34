use thiserror::Error;

/// Error type for key material retrieval.
///
/// Every variant means signing and verification cannot proceed; callers
/// propagate it as a service-level failure rather than retrying.
#[derive(Debug, Clone, Error)]
pub enum KeyError {
    #[error("Secret store unavailable: {0}")]
    Unavailable(String),

    #[error("Secret is missing field: {0}")]
    MissingField(String),

    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("Public key does not belong to the private key")]
    KeyMismatch,
}
