//! Authentication utilities library
//!
//! Provides reusable authentication infrastructure for microservices:
//! - Password hashing (Argon2id)
//! - RSA key material fetched from a secret store and cached per provider
//! - RS256 token generation and validation with `kid` headers
//! - Key-set (JWKS) export for external verifiers
//!
//! Services define their own identity model and use cases on top of these
//! pieces; nothing here enforces permission scopes.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! assert!(!hasher.verify("other_password", &hash));
//! ```
//!
//! ## Signed Tokens
//! ```no_run
//! use std::time::Duration;
//!
//! use auth::{JwtSettings, JwtTokenGenerator, KeyProvider, SecretStoreKeyProvider};
//! use auth::{TokenGenerator, TokenPayload, VaultSecretStore, VaultSettings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = VaultSecretStore::new(VaultSettings {
//!     endpoint: "http://vault:8200".to_string(),
//!     token: "s.token".to_string(),
//!     request_timeout: Duration::from_secs(5),
//! })?;
//! let keys = SecretStoreKeyProvider::new(store, "secret/data/auth/jwt");
//! let generator = JwtTokenGenerator::new(keys, JwtSettings::new("auth-service", "tracking-api"));
//!
//! let payload = TokenPayload::new("user123", "a@x.com", vec!["read".to_string()]);
//! let token = generator.generate_token(&payload).await?;
//! let decoded = generator.decode_token(&token).await?;
//! assert_eq!(decoded.map(|p| p.sub), Some("user123".to_string()));
//!
//! let jwks = generator.key_provider().jwks().await?;
//! println!("{}", serde_json::to_string(&jwks)?);
//! # Ok(())
//! # }
//! ```

pub mod jwt;
pub mod keys;
pub mod password;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

// Re-export commonly used items
pub use jwt::Claims;
pub use jwt::JwtError;
pub use jwt::JwtSettings;
pub use jwt::JwtTokenGenerator;
pub use jwt::TokenGenerator;
pub use jwt::TokenPayload;
pub use keys::Jwk;
pub use keys::Jwks;
pub use keys::KeyError;
pub use keys::KeyMaterial;
pub use keys::KeyProvider;
pub use keys::SecretStore;
pub use keys::SecretStoreKeyProvider;
pub use keys::StaticSecretStore;
pub use keys::VaultSecretStore;
pub use keys::VaultSettings;
pub use password::PasswordError;
pub use password::PasswordHasher;
