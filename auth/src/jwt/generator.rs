use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::decode_header;
use jsonwebtoken::encode;
use jsonwebtoken::Algorithm;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::claims::TokenPayload;
use super::errors::JwtError;
use crate::keys::KeyMaterial;
use crate::keys::KeyProvider;

/// The only algorithm tokens are signed and accepted with.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::RS256;

/// Default validity window (1 hour).
pub const DEFAULT_VALIDITY_SECS: i64 = 3_600;

/// Issues and verifies signed identity tokens.
#[async_trait]
pub trait TokenGenerator: Send + Sync + 'static {
    /// Sign a token for `payload`.
    ///
    /// # Errors
    /// * `KeyUnavailable` - Signing key could not be obtained
    /// * `EncodingFailed` - Signing failed
    async fn generate_token(&self, payload: &TokenPayload) -> Result<String, JwtError>;

    /// Check a token's signature, algorithm, issuer, audience and time window.
    ///
    /// # Returns
    /// `Ok(false)` for every verification failure
    ///
    /// # Errors
    /// * `KeyUnavailable` - Verification key could not be obtained
    async fn validate_token(&self, token: &str) -> Result<bool, JwtError>;

    /// Verify a token like [`validate_token`](Self::validate_token) and return its payload.
    ///
    /// # Returns
    /// `Ok(None)` for every verification failure
    ///
    /// # Errors
    /// * `KeyUnavailable` - Verification key could not be obtained
    async fn decode_token(&self, token: &str) -> Result<Option<TokenPayload>, JwtError>;

    /// Seconds between issuance and expiry of generated tokens.
    fn validity_secs(&self) -> i64;
}

/// Generator-owned claim settings.
#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub issuer: String,
    pub audience: String,
    pub validity_secs: i64,
    /// Accepted clock skew in seconds for `nbf` and `exp`
    pub leeway_secs: u64,
}

impl JwtSettings {
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            validity_secs: DEFAULT_VALIDITY_SECS,
            leeway_secs: 0,
        }
    }

    pub fn with_validity_secs(mut self, validity_secs: i64) -> Self {
        self.validity_secs = validity_secs;
        self
    }

    pub fn with_leeway_secs(mut self, leeway_secs: u64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }
}

/// RS256 token generator backed by a [`KeyProvider`].
///
/// Tokens carry the provider's key id in the `kid` header. Verification is
/// all-or-nothing: a token with any bad field is rejected as a whole.
pub struct JwtTokenGenerator<K: KeyProvider> {
    key_provider: K,
    settings: JwtSettings,
    validation: Validation,
}

impl<K: KeyProvider> JwtTokenGenerator<K> {
    /// Create a generator signing with keys from `key_provider`.
    pub fn new(key_provider: K, settings: JwtSettings) -> Self {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.set_issuer(&[settings.issuer.as_str()]);
        validation.set_audience(&[settings.audience.as_str()]);
        validation.set_required_spec_claims(&["sub", "iss", "aud", "iat", "nbf", "exp"]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = settings.leeway_secs;

        Self {
            key_provider,
            settings,
            validation,
        }
    }

    pub fn key_provider(&self) -> &K {
        &self.key_provider
    }

    async fn verify(&self, token: &str) -> Result<Option<Claims>, JwtError> {
        let material = self.key_provider.key_material().await?;
        Ok(self.verify_with(&material, token))
    }

    fn verify_with(&self, material: &KeyMaterial, token: &str) -> Option<Claims> {
        let header = match decode_header(token) {
            Ok(header) => header,
            Err(e) => {
                tracing::debug!(error = %e, "Rejected token with malformed header");
                return None;
            }
        };

        if header.kid.as_deref() != Some(material.key_id()) {
            tracing::debug!(
                kid = ?header.kid,
                expected_kid = %material.key_id(),
                "Rejected token signed with unknown key"
            );
            return None;
        }

        let claims = match decode::<Claims>(token, material.decoding_key(), &self.validation) {
            Ok(data) => data.claims,
            Err(e) => {
                tracing::debug!(error = %e, "Rejected token");
                return None;
            }
        };

        // The library compares with `exp < now - leeway`; tokens are also
        // dead at exactly `exp`.
        let now = Utc::now().timestamp();
        if !claims.is_active_at(now, self.settings.leeway_secs as i64) {
            tracing::debug!(
                now,
                nbf = claims.nbf,
                exp = claims.exp,
                "Rejected token outside validity window"
            );
            return None;
        }

        Some(claims)
    }
}

#[async_trait]
impl<K: KeyProvider> TokenGenerator for JwtTokenGenerator<K> {
    async fn generate_token(&self, payload: &TokenPayload) -> Result<String, JwtError> {
        let material = self.key_provider.key_material().await?;

        let claims = Claims::issue(
            payload,
            &self.settings.issuer,
            &self.settings.audience,
            Utc::now().timestamp(),
            self.settings.validity_secs,
        );

        let mut header = Header::new(SIGNING_ALGORITHM);
        header.kid = Some(material.key_id().to_string());

        encode(&header, &claims, material.encoding_key())
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    async fn validate_token(&self, token: &str) -> Result<bool, JwtError> {
        Ok(self.verify(token).await?.is_some())
    }

    async fn decode_token(&self, token: &str) -> Result<Option<TokenPayload>, JwtError> {
        Ok(self.verify(token).await?.map(TokenPayload::from))
    }

    fn validity_secs(&self) -> i64 {
        self.settings.validity_secs
    }
}
