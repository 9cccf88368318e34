use std::sync::OnceLock;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher as Argon2PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::Argon2;

use super::errors::PasswordError;

/// Input hashed once per process to produce the decoy hash.
const DECOY_INPUT: &str = "decoy-password-for-unknown-accounts";

/// Password hashing implementation.
///
/// Provides cryptographic password hashing (internally uses Argon2id).
/// Each hash embeds its own random salt, so hashing the same password twice
/// yields two different PHC strings that both verify.
pub struct PasswordHasher {
    decoy_hash: OnceLock<Option<String>>,
}

impl PasswordHasher {
    /// Create a new password hasher instance.
    ///
    /// # Returns
    /// PasswordHasher instance configured with secure defaults
    pub fn new() -> Self {
        Self {
            decoy_hash: OnceLock::new(),
        }
    }

    /// Hash a plaintext password securely.
    ///
    /// Uses Argon2id with random salt generation.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to hash
    ///
    /// # Returns
    /// PHC string format hash (includes algorithm, parameters, salt, and hash)
    ///
    /// # Errors
    /// * `HashingFailed` - Password hashing operation failed
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Verify a password against a stored hash.
    ///
    /// The comparison itself is constant-time inside Argon2. A stored hash
    /// that cannot be parsed is treated as a mismatch rather than an error so
    /// credential checks never surface internal failures.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `hash` - Stored password hash in PHC string format
    ///
    /// # Returns
    /// True if password matches, false otherwise
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is malformed");
                return false;
            }
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Build the decoy hash now instead of on the first unknown-account check.
    pub fn prepare_decoy(&self) {
        self.decoy();
    }

    pub fn is_decoy_ready(&self) -> bool {
        matches!(self.decoy_hash.get(), Some(Some(_)))
    }

    /// Run a full verification against a throwaway hash and discard the result.
    ///
    /// Used when no stored hash exists so that the caller spends the same
    /// amount of work as for a real mismatch.
    pub fn verify_decoy(&self, password: &str) {
        if let Some(decoy) = self.decoy() {
            let _ = self.verify(password, decoy);
        }
    }

    fn decoy(&self) -> Option<&String> {
        self.decoy_hash
            .get_or_init(|| self.hash(DECOY_INPUT).ok())
            .as_ref()
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}
