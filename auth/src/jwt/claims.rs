use serde::Deserialize;
use serde::Serialize;

/// Identity data carried by a token.
///
/// Callers supply `sub`, `email` and `scope`; the generator owns the
/// remaining fields and ignores any values set on input. A payload returned
/// by a successful decode has every field populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPayload {
    /// Subject (identity identifier)
    pub sub: String,
    pub email: String,
    /// Permission scopes, in the order they were granted
    pub scope: Vec<String>,
    pub iss: Option<String>,
    pub aud: Option<String>,
    /// Issued at (Unix timestamp)
    pub iat: Option<i64>,
    /// Not before (Unix timestamp)
    pub nbf: Option<i64>,
    /// Expiration time (Unix timestamp)
    pub exp: Option<i64>,
}

impl TokenPayload {
    /// Create a payload for an identity.
    ///
    /// # Arguments
    /// * `sub` - Identity identifier
    /// * `email` - Identity email address
    /// * `scope` - Permission scopes carried by the token
    pub fn new(sub: impl ToString, email: impl ToString, scope: Vec<String>) -> Self {
        Self {
            sub: sub.to_string(),
            email: email.to_string(),
            scope,
            iss: None,
            aud: None,
            iat: None,
            nbf: None,
            exp: None,
        }
    }

    /// Whether the token carries the given scope.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scope.iter().any(|s| s == scope)
    }

    /// Seconds between issuance and expiry, when both are known.
    pub fn validity_secs(&self) -> Option<i64> {
        Some(self.exp? - self.iat?)
    }
}

/// Signed claim set, as serialized into the token body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub scope: Vec<String>,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

impl Claims {
    /// Build claims for a payload issued at `now` and valid for `validity_secs`.
    pub fn issue(
        payload: &TokenPayload,
        issuer: &str,
        audience: &str,
        now: i64,
        validity_secs: i64,
    ) -> Self {
        Self {
            sub: payload.sub.clone(),
            email: payload.email.clone(),
            scope: payload.scope.clone(),
            iss: issuer.to_string(),
            aud: audience.to_string(),
            iat: now,
            nbf: now,
            exp: now + validity_secs,
        }
    }

    /// Check the `nbf`/`exp` window: `nbf - leeway <= now < exp + leeway`.
    pub fn is_active_at(&self, now: i64, leeway: i64) -> bool {
        now + leeway >= self.nbf && now - leeway < self.exp
    }
}

impl From<Claims> for TokenPayload {
    fn from(claims: Claims) -> Self {
        Self {
            sub: claims.sub,
            email: claims.email,
            scope: claims.scope,
            iss: Some(claims.iss),
            aud: Some(claims.aud),
            iat: Some(claims.iat),
            nbf: Some(claims.nbf),
            exp: Some(claims.exp),
        }
    }
}
