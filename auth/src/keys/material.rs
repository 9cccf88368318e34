use std::fmt;

use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::RsaPrivateKey;
use rsa::RsaPublicKey;
use sha2::Digest;
use sha2::Sha256;

use super::errors::KeyError;
use super::jwks::Jwk;

/// Number of hex characters kept from the public key fingerprint.
pub const KEY_ID_LENGTH: usize = 8;

/// Derive the key identifier for a PEM-encoded public key.
///
/// SHA-256 over the PEM text, hex-encoded, truncated to [`KEY_ID_LENGTH`].
/// The same PEM always yields the same identifier.
pub fn derive_key_id(public_key_pem: &str) -> String {
    let digest = Sha256::digest(public_key_pem.as_bytes());
    let mut key_id = hex::encode(digest);
    key_id.truncate(KEY_ID_LENGTH);
    key_id
}

/// A matching RSA key pair together with its derived identifier.
///
/// Constructed only through [`KeyMaterial::from_pem`], which guarantees the
/// public key belongs to the private key.
#[derive(Clone)]
pub struct KeyMaterial {
    private_key_pem: String,
    public_key_pem: String,
    key_id: String,
    public_key: RsaPublicKey,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl KeyMaterial {
    /// Parse and pair-check PEM-encoded keys.
    ///
    /// Accepts PKCS#8 or PKCS#1 private keys and SPKI or PKCS#1 public keys.
    ///
    /// # Errors
    /// * `InvalidKey` - Either PEM fails to parse as an RSA key
    /// * `KeyMismatch` - The public key is not derived from the private key
    pub fn from_pem(private_key_pem: &str, public_key_pem: &str) -> Result<Self, KeyError> {
        let private_key = parse_private_key(private_key_pem)?;
        let public_key = parse_public_key(public_key_pem)?;

        if private_key.to_public_key() != public_key {
            return Err(KeyError::KeyMismatch);
        }

        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| KeyError::InvalidKey(format!("private key: {}", e)))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| KeyError::InvalidKey(format!("public key: {}", e)))?;

        Ok(Self {
            private_key_pem: private_key_pem.to_string(),
            public_key_pem: public_key_pem.to_string(),
            key_id: derive_key_id(public_key_pem),
            public_key,
            encoding_key,
            decoding_key,
        })
    }

    pub fn private_key_pem(&self) -> &str {
        &self.private_key_pem
    }

    pub fn public_key_pem(&self) -> &str {
        &self.public_key_pem
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }

    /// Export the public half as a JWK record.
    pub fn to_jwk(&self) -> Jwk {
        Jwk::from_rsa_public_key(&self.public_key, &self.key_id)
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("key_id", &self.key_id)
            .field("private_key", &"[hidden]")
            .finish()
    }
}

fn parse_private_key(pem: &str) -> Result<RsaPrivateKey, KeyError> {
    let parsed = if pem.contains("BEGIN RSA PRIVATE KEY") {
        RsaPrivateKey::from_pkcs1_pem(pem).map_err(|e| e.to_string())
    } else {
        RsaPrivateKey::from_pkcs8_pem(pem).map_err(|e| e.to_string())
    };

    parsed.map_err(|e| KeyError::InvalidKey(format!("private key: {}", e)))
}

fn parse_public_key(pem: &str) -> Result<RsaPublicKey, KeyError> {
    let parsed = if pem.contains("BEGIN RSA PUBLIC KEY") {
        RsaPublicKey::from_pkcs1_pem(pem).map_err(|e| e.to_string())
    } else {
        RsaPublicKey::from_public_key_pem(pem).map_err(|e| e.to_string())
    };

    parsed.map_err(|e| KeyError::InvalidKey(format!("public key: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::OTHER_PUBLIC_KEY_PEM;
    use crate::testutil::TEST_PRIVATE_KEY_PEM;
    use crate::testutil::TEST_PUBLIC_KEY_PEM;

    #[test]
    fn test_from_pem_matching_pair() {
        let material = KeyMaterial::from_pem(TEST_PRIVATE_KEY_PEM, TEST_PUBLIC_KEY_PEM)
            .expect("Failed to load key pair");

        assert_eq!(material.key_id(), derive_key_id(TEST_PUBLIC_KEY_PEM));
        assert_eq!(material.public_key_pem(), TEST_PUBLIC_KEY_PEM);
    }

    #[test]
    fn test_from_pem_rejects_mismatched_pair() {
        let result = KeyMaterial::from_pem(TEST_PRIVATE_KEY_PEM, OTHER_PUBLIC_KEY_PEM);
        assert!(matches!(result, Err(KeyError::KeyMismatch)));
    }

    #[test]
    fn test_from_pem_rejects_garbage() {
        let result = KeyMaterial::from_pem("not a key", TEST_PUBLIC_KEY_PEM);
        assert!(matches!(result, Err(KeyError::InvalidKey(_))));

        let result = KeyMaterial::from_pem(TEST_PRIVATE_KEY_PEM, "not a key");
        assert!(matches!(result, Err(KeyError::InvalidKey(_))));
    }

    #[test]
    fn test_derive_key_id_is_stable_and_short() {
        let first = derive_key_id(TEST_PUBLIC_KEY_PEM);
        let second = derive_key_id(TEST_PUBLIC_KEY_PEM);

        assert_eq!(first, second);
        assert_eq!(first.len(), KEY_ID_LENGTH);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, derive_key_id(OTHER_PUBLIC_KEY_PEM));
    }

    #[test]
    fn test_debug_hides_private_key() {
        let material = KeyMaterial::from_pem(TEST_PRIVATE_KEY_PEM, TEST_PUBLIC_KEY_PEM)
            .expect("Failed to load key pair");
        let rendered = format!("{:?}", material);
        assert!(!rendered.contains("PRIVATE KEY"));
        assert!(rendered.contains(material.key_id()));
    }
}
