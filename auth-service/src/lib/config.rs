use std::env;
use std::fmt;
use std::time::Duration;

use auth::JwtSettings;
use auth::VaultSettings;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub jwt: JwtConfig,
    pub vault: VaultConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    #[serde(default = "default_validity_secs")]
    pub validity_secs: i64,
    #[serde(default)]
    pub leeway_secs: u64,
}

#[derive(Deserialize, Clone)]
pub struct VaultConfig {
    pub endpoint: String,
    pub token: String,
    pub secret_path: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Longest accepted token lifetime (30 days).
pub const MAX_VALIDITY_SECS: i64 = 30 * 24 * 3_600;

/// Largest accepted clock-skew allowance (5 minutes).
pub const MAX_LEEWAY_SECS: u64 = 300;

fn default_validity_secs() -> i64 {
    auth::jwt::generator::DEFAULT_VALIDITY_SECS
}

fn default_timeout_secs() -> u64 {
    5
}

impl From<&JwtConfig> for JwtSettings {
    fn from(config: &JwtConfig) -> Self {
        JwtSettings::new(config.issuer.as_str(), config.audience.as_str())
            .with_validity_secs(config.validity_secs)
            .with_leeway_secs(config.leeway_secs)
    }
}

impl JwtConfig {
    /// Reject windows that would issue dead tokens or overflow time arithmetic.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_VALIDITY_SECS).contains(&self.validity_secs) {
            return Err(ConfigError::Message(format!(
                "jwt.validity_secs must be between 1 and {}, got {}",
                MAX_VALIDITY_SECS, self.validity_secs
            )));
        }

        if self.leeway_secs > MAX_LEEWAY_SECS {
            return Err(ConfigError::Message(format!(
                "jwt.leeway_secs must be at most {}, got {}",
                MAX_LEEWAY_SECS, self.leeway_secs
            )));
        }

        Ok(())
    }
}

impl VaultConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn settings(&self) -> VaultSettings {
        VaultSettings {
            endpoint: self.endpoint.clone(),
            token: self.token.clone(),
            request_timeout: self.timeout(),
        }
    }
}

impl fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &"[hidden]")
            .field("secret_path", &self.secret_path)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (VAULT__TOKEN, JWT__ISSUER, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: VAULT__TOKEN=hvs.... overrides vault.token
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        Self::from_source(configuration)
    }

    fn from_source(configuration: ConfigBuilder) -> Result<Self, ConfigError> {
        let config: Config = configuration.try_deserialize()?;
        config.jwt.validate()?;

        Ok(config)
    }
}
