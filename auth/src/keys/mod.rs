pub mod errors;
pub mod jwks;
pub mod material;
pub mod provider;
pub mod secret_store;

pub use errors::KeyError;
pub use jwks::Jwk;
pub use jwks::Jwks;
pub use material::derive_key_id;
pub use material::KeyMaterial;
pub use provider::KeyProvider;
pub use provider::SecretStoreKeyProvider;
pub use secret_store::SecretStore;
pub use secret_store::StaticSecretStore;
pub use secret_store::VaultSecretStore;
pub use secret_store::VaultSettings;
