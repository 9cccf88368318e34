use std::sync::Arc;

use async_trait::async_trait;
use auth::TokenGenerator;
use auth::TokenPayload;
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
use crate::identity::ports::AuthServicePort;
use crate::identity::ports::IdentityRepository;

/// Domain service implementation for authentication.
///
/// The single place where credential-failure policy is decided: unknown
/// emails and wrong passwords both become `InvalidCredentials`, while a
/// disabled account is reported as `UserNotActive`.
pub struct AuthService<IR, TG>
where
    IR: IdentityRepository,
    TG: TokenGenerator,
{
    repository: Arc<IR>,
    token_generator: Arc<TG>,
    password_hasher: auth::PasswordHasher,
}

impl<IR, TG> AuthService<IR, TG>
where
    IR: IdentityRepository,
    TG: TokenGenerator,
{
    /// Create a new auth service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - Identity persistence implementation
    /// * `token_generator` - Token signing and verification implementation
    pub fn new(repository: Arc<IR>, token_generator: Arc<TG>) -> Self {
        let password_hasher = auth::PasswordHasher::new();
        // The first unknown-email login must not pay for building the decoy.
        password_hasher.prepare_decoy();

        Self {
            repository,
            token_generator,
            password_hasher,
        }
    }

    /// Hash a plaintext password with the service's hasher.
    ///
    /// # Errors
    /// * `Password` - Hashing failed
    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        Ok(self.password_hasher.hash(password)?)
    }

    async fn issue(&self, identity: &Identity) -> Result<AuthResult, AuthError> {
        let payload = TokenPayload::new(
            identity.id,
            identity.email.as_str(),
            identity.scopes.clone(),
        );

        let token = self.token_generator.generate_token(&payload).await?;

        Ok(AuthResult {
            token,
            identity: identity.to_public(),
            expires_in: self.token_generator.validity_secs(),
        })
    }

    /// Map a token back to a live, active identity.
    async fn resolve(&self, token: &str) -> Result<Identity, AuthError> {
        let payload = self
            .token_generator
            .decode_token(token)
            .await?
            .ok_or(AuthError::TokenInvalid)?;

        let id = IdentityId::from_string(&payload.sub).map_err(|_| AuthError::TokenInvalid)?;

        let identity = self
            .repository
            .find_by_id(&id)
            .await?
            .ok_or(AuthError::TokenInvalid)?;

        if !identity.active {
            return Err(AuthError::UserNotActive);
        }

        Ok(identity)
    }

    fn reject_credentials(&self, password: &str) -> AuthError {
        self.password_hasher.verify_decoy(password);
        AuthError::InvalidCredentials
    }
}

#[async_trait]
impl<IR, TG> AuthServicePort for AuthService<IR, TG>
where
    IR: IdentityRepository,
    TG: TokenGenerator,
{
    async fn authenticate(&self, credentials: Credentials) -> Result<AuthResult, AuthError> {
        let Ok(email) = EmailAddress::new(credentials.email) else {
            return Err(self.reject_credentials(&credentials.password));
        };

        let Some(identity) = self.repository.find_by_email(&email).await? else {
            tracing::info!("Authentication failed: invalid credentials");
            return Err(self.reject_credentials(&credentials.password));
        };

        if !identity.active {
            tracing::info!(
                identity_id = %identity.id,
                "Authentication refused: account not active"
            );
            return Err(AuthError::UserNotActive);
        }

        if !self
            .password_hasher
            .verify(&credentials.password, &identity.password_hash)
        {
            tracing::info!("Authentication failed: invalid credentials");
            return Err(AuthError::InvalidCredentials);
        }

        let result = self.issue(&identity).await?;

        if let Err(e) = self
            .repository
            .update_last_login(&identity.id, Utc::now())
            .await
        {
            tracing::warn!(
                identity_id = %identity.id,
                error = %e,
                "Failed to record last login"
            );
        }

        tracing::info!(identity_id = %identity.id, "Authentication succeeded");

        Ok(result)
    }

    async fn register(&self, command: RegisterIdentityCommand) -> Result<AuthResult, AuthError> {
        if self.repository.find_by_email(&command.email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists(command.email.to_string()));
        }

        let password_hash = self.hash_password(&command.password)?;
        let identity = Identity::new(command.email, password_hash, command.scopes);

        let created = self
            .repository
            .create(identity)
            .await
            .map_err(|e| match e {
                RepositoryError::EmailAlreadyExists(email) => AuthError::EmailAlreadyExists(email),
                other => AuthError::Repository(other),
            })?;

        tracing::info!(identity_id = %created.id, "Identity registered");

        self.issue(&created).await
    }

    async fn refresh_token(&self, token: &str) -> Result<AuthResult, AuthError> {
        let identity = self.resolve(token).await?;
        self.issue(&identity).await
    }

    async fn verify_token(&self, token: &str) -> Result<PublicIdentity, AuthError> {
        Ok(self.resolve(token).await?.to_public())
    }
}
