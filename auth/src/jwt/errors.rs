use thiserror::Error;

use crate::keys::KeyError;

/// Error type for JWT operations.
///
/// Verification failures are not errors: they surface as `false` / `None`
/// from the token generator. Only failures to obtain keys or to sign are
/// reported here.
#[derive(Debug, Clone, Error)]
pub enum JwtError {
    #[error("Signing keys unavailable: {0}")]
    KeyUnavailable(#[from] KeyError),

    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),
}
