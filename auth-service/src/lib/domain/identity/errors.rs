use auth::JwtError;
use auth::KeyError;
use auth::PasswordError;
use thiserror::Error;

/// Error for IdentityId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error reported by identity storage.
///
/// Missing rows are not errors; lookups return `None` instead.
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    #[error("Email already exists: {0}")]
    EmailAlreadyExists(String),

    #[error("Identity not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Top-level error for authentication operations
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    // Caller-facing failures
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User account is not active")]
    UserNotActive,

    #[error("Token is invalid")]
    TokenInvalid,

    #[error("Email already exists: {0}")]
    EmailAlreadyExists(String),

    // Infrastructure errors
    #[error("Signing keys unavailable: {0}")]
    KeyUnavailable(#[from] KeyError),

    #[error("Token generation failed: {0}")]
    TokenGeneration(String),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl AuthError {
    /// Whether the failure is an infrastructure problem (5xx-equivalent)
    /// rather than something the caller did.
    pub fn is_service_failure(&self) -> bool {
        matches!(
            self,
            AuthError::KeyUnavailable(_)
                | AuthError::TokenGeneration(_)
                | AuthError::Password(_)
                | AuthError::Repository(_)
        )
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::KeyUnavailable(e) => AuthError::KeyUnavailable(e),
            JwtError::EncodingFailed(e) => AuthError::TokenGeneration(e),
        }
    }
}
