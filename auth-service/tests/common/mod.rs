use std::sync::Arc;

use auth::testutil;
use auth::JwtTokenGenerator;
use auth::SecretStoreKeyProvider;
use auth::StaticSecretStore;
use auth_service::domain::identity::models::EmailAddress;
use auth_service::domain::identity::models::Identity;
use auth_service::domain::identity::ports::IdentityRepository;
use auth_service::domain::identity::service::AuthService;
use auth_service::outbound::repositories::InMemoryIdentityRepository;

pub type TestTokenGenerator = JwtTokenGenerator<SecretStoreKeyProvider<StaticSecretStore>>;

/// Auth service wired to the in-memory repository and the fixed test key pair
pub struct TestApp {
    pub service: AuthService<InMemoryIdentityRepository, TestTokenGenerator>,
    pub repository: Arc<InMemoryIdentityRepository>,
    pub token_generator: Arc<TestTokenGenerator>,
}

impl TestApp {
    pub fn spawn() -> Self {
        Self::with_token_generator(JwtTokenGenerator::new(
            testutil::test_key_provider(),
            testutil::test_settings(),
        ))
    }

    pub fn with_token_generator(token_generator: TestTokenGenerator) -> Self {
        let repository = Arc::new(InMemoryIdentityRepository::new());
        let token_generator = Arc::new(token_generator);
        let service = AuthService::new(Arc::clone(&repository), Arc::clone(&token_generator));

        Self {
            service,
            repository,
            token_generator,
        }
    }

    /// Store an identity directly, bypassing registration
    pub async fn seed(&self, email: &str, password: &str, scopes: &[&str]) -> Identity {
        let hash = self
            .service
            .hash_password(password)
            .expect("Failed to hash password");
        let identity = Identity::new(
            EmailAddress::new(email.to_string()).expect("Invalid test email"),
            hash,
            scopes.iter().map(|s| s.to_string()).collect(),
        );

        self.repository
            .create(identity)
            .await
            .expect("Failed to seed identity")
    }

    pub async fn deactivate(&self, identity: &Identity) {
        let mut disabled = identity.clone();
        disabled.active = false;
        self.repository
            .save(disabled)
            .await
            .expect("Failed to deactivate identity");
    }
}
