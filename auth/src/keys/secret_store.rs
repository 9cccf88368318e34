use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::errors::KeyError;

/// Read access to a remote secret store.
#[async_trait]
pub trait SecretStore: Send + Sync + 'static {
    /// Read the string fields of the secret stored at `path`.
    ///
    /// # Errors
    /// * `Unavailable` - Store unreachable, request rejected or body unreadable
    async fn read(&self, path: &str) -> Result<HashMap<String, String>, KeyError>;
}

/// Vault connection settings.
#[derive(Clone)]
pub struct VaultSettings {
    pub endpoint: String,
    pub token: String,
    pub request_timeout: Duration,
}

impl fmt::Debug for VaultSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultSettings")
            .field("endpoint", &self.endpoint)
            .field("token", &"[hidden]")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// HashiCorp Vault client reading secrets over HTTP.
///
/// `path` is the API path below `/v1/`, e.g. `secret/data/auth/jwt`.
/// Both KV v1 (`data`) and KV v2 (`data.data`) response shapes are accepted.
#[derive(Debug)]
pub struct VaultSecretStore {
    settings: VaultSettings,
    http_client: reqwest::Client,
}

#[derive(Deserialize)]
struct VaultResponse {
    data: serde_json::Map<String, serde_json::Value>,
}

impl VaultSecretStore {
    /// Build a client for the given Vault instance.
    ///
    /// # Errors
    /// * `Unavailable` - HTTP client could not be constructed
    pub fn new(settings: VaultSettings) -> Result<Self, KeyError> {
        let http_client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| KeyError::Unavailable(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            settings,
            http_client,
        })
    }
}

#[async_trait]
impl SecretStore for VaultSecretStore {
    async fn read(&self, path: &str) -> Result<HashMap<String, String>, KeyError> {
        let url = format!(
            "{}/v1/{}",
            self.settings.endpoint.trim_end_matches('/'),
            path.trim_start_matches('/')
        );

        let response = self
            .http_client
            .get(&url)
            .header("X-Vault-Token", &self.settings.token)
            .send()
            .await
            .map_err(|e| KeyError::Unavailable(format!("Vault request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(KeyError::Unavailable(format!(
                "Vault returned error status: {}",
                response.status()
            )));
        }

        let body: VaultResponse = response
            .json()
            .await
            .map_err(|e| KeyError::Unavailable(format!("Failed to parse Vault response: {}", e)))?;

        let fields = match body.data.get("data") {
            Some(serde_json::Value::Object(nested)) => nested.clone(),
            _ => body.data,
        };

        Ok(fields
            .into_iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k, s.to_string())))
            .collect())
    }
}

/// In-process secret store backed by a fixed map.
///
/// Used for local runs without Vault and in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSecretStore {
    secrets: HashMap<String, HashMap<String, String>>,
}

impl StaticSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, path: impl Into<String>, data: HashMap<String, String>) -> Self {
        self.secrets.insert(path.into(), data);
        self
    }
}

#[async_trait]
impl SecretStore for StaticSecretStore {
    async fn read(&self, path: &str) -> Result<HashMap<String, String>, KeyError> {
        self.secrets
            .get(path)
            .cloned()
            .ok_or_else(|| KeyError::Unavailable(format!("No secret at path: {}", path)))
    }
}
