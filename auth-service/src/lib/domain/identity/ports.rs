use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::identity::models::AuthResult;
use crate::domain::identity::models::Credentials;
use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::Identity;
use crate::domain::identity::models::IdentityId;
use crate::domain::identity::models::PublicIdentity;
use crate::domain::identity::models::RegisterIdentityCommand;
use crate::identity::errors::AuthError;
use crate::identity::errors::RepositoryError;

/// Port for authentication operations.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Verify credentials and issue a token.
    ///
    /// # Arguments
    /// * `credentials` - Email and plaintext password
    ///
    /// # Returns
    /// Token, sanitized identity and validity window
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email or wrong password (indistinguishable)
    /// * `UserNotActive` - Account exists but is disabled
    /// * `KeyUnavailable` - Signing keys could not be loaded
    /// * `Repository` - Identity lookup failed
    async fn authenticate(&self, credentials: Credentials) -> Result<AuthResult, AuthError>;

    /// Create a new identity and issue its first token.
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `Password` - Password hashing failed
    /// * `KeyUnavailable` - Signing keys could not be loaded
    /// * `Repository` - Storage failed
    async fn register(&self, command: RegisterIdentityCommand) -> Result<AuthResult, AuthError>;

    /// Exchange a valid token for a fresh one carrying current scopes.
    ///
    /// # Errors
    /// * `TokenInvalid` - Token fails verification or its identity is gone
    /// * `UserNotActive` - Identity has been disabled since issuance
    /// * `KeyUnavailable` - Keys could not be loaded
    async fn refresh_token(&self, token: &str) -> Result<AuthResult, AuthError>;

    /// Resolve a token to the identity it was issued for.
    ///
    /// # Errors
    /// * `TokenInvalid` - Token fails verification or its identity is gone
    /// * `UserNotActive` - Identity has been disabled since issuance
    /// * `KeyUnavailable` - Keys could not be loaded
    async fn verify_token(&self, token: &str) -> Result<PublicIdentity, AuthError>;
}

/// Persistence operations for identities.
///
/// Lookups return `Ok(None)` when nothing matches and `Err` only when the
/// store itself fails.
#[async_trait]
pub trait IdentityRepository: Send + Sync + 'static {
    /// Persist a new identity.
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `DatabaseError` - Storage failed
    async fn create(&self, identity: Identity) -> Result<Identity, RepositoryError>;

    /// Retrieve identity by identifier.
    ///
    /// # Errors
    /// * `DatabaseError` - Storage failed
    async fn find_by_id(&self, id: &IdentityId) -> Result<Option<Identity>, RepositoryError>;

    /// Retrieve identity by email, whether active or not.
    ///
    /// # Errors
    /// * `DatabaseError` - Storage failed
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Identity>, RepositoryError>;

    /// Record a successful login.
    ///
    /// # Errors
    /// * `NotFound` - Identity does not exist
    /// * `DatabaseError` - Storage failed
    async fn update_last_login(
        &self,
        id: &IdentityId,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;
}
