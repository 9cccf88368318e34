use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::identity::errors::EmailError;
use crate::identity::errors::IdentityIdError;

/// Stored account with credentials and permission scopes.
///
/// Owned by the repository; authentication reads it and only records
/// successful logins.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: IdentityId,
    pub email: EmailAddress,
    pub password_hash: String,
    /// Permission scopes, in grant order. Carried into tokens, not enforced here.
    pub scopes: Vec<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl Identity {
    /// Create a new active identity with a fresh identifier.
    ///
    /// # Arguments
    /// * `email` - Validated email address
    /// * `password_hash` - Already hashed password
    /// * `scopes` - Granted permission scopes
    pub fn new(email: EmailAddress, password_hash: String, scopes: Vec<String>) -> Self {
        Self {
            id: IdentityId::new(),
            email,
            password_hash,
            scopes,
            active: true,
            created_at: Utc::now(),
            last_login_at: None,
        }
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }

    /// Sanitized view safe to return to callers.
    pub fn to_public(&self) -> PublicIdentity {
        PublicIdentity {
            id: self.id.to_string(),
            email: self.email.as_str().to_string(),
            scopes: self.scopes.clone(),
        }
    }
}

/// Identity unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentityId(pub Uuid);

impl IdentityId {
    /// Generate a new random identity ID.
    ///
    /// # Returns
    /// IdentityId with random UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identity ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, IdentityIdError> {
        Uuid::parse_str(s)
            .map(IdentityId)
            .map_err(|e| IdentityIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for IdentityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser. Login looks
/// identities up by this value; there is no separate username.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Login credentials. Exist only for the duration of a login call.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[hidden]")
            .finish()
    }
}

/// Command to register a new identity with domain types
pub struct RegisterIdentityCommand {
    pub email: EmailAddress,
    pub password: String,
    pub scopes: Vec<String>,
}

impl RegisterIdentityCommand {
    /// Construct a new register command.
    ///
    /// # Arguments
    /// * `email` - Validated email address
    /// * `password` - Plain text password (will be hashed by service)
    /// * `scopes` - Permission scopes to grant
    pub fn new(email: EmailAddress, password: String, scopes: Vec<String>) -> Self {
        Self {
            email,
            password,
            scopes,
        }
    }
}

impl fmt::Debug for RegisterIdentityCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterIdentityCommand")
            .field("email", &self.email)
            .field("password", &"[hidden]")
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Identity as exposed to callers. Never includes the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicIdentity {
    pub id: String,
    pub email: String,
    pub scopes: Vec<String>,
}

/// Outcome of a successful login, registration or refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthResult {
    pub token: String,
    pub identity: PublicIdentity,
    /// Token validity window in seconds
    pub expires_in: i64,
}
