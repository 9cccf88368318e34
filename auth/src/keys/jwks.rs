use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rsa::traits::PublicKeyParts;
use rsa::RsaPublicKey;
use serde::Deserialize;
use serde::Serialize;

/// Single public key record of a key-set document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    #[serde(rename = "use")]
    pub key_use: String,
    pub kid: String,
    /// RSA modulus (base64url, unpadded)
    pub n: String,
    /// RSA public exponent (base64url, unpadded)
    pub e: String,
    pub alg: String,
}

impl Jwk {
    pub fn from_rsa_public_key(public_key: &RsaPublicKey, key_id: &str) -> Self {
        Self {
            kty: "RSA".to_string(),
            key_use: "sig".to_string(),
            kid: key_id.to_string(),
            n: URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be()),
            e: URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be()),
            alg: "RS256".to_string(),
        }
    }
}

/// Key-set document published for external verifiers: `{ "keys": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

impl Jwks {
    /// Find a key by identifier.
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid == kid)
    }
}
