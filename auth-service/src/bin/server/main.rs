use auth::JwtSettings;
use auth::JwtTokenGenerator;
use auth::KeyProvider;
use auth::SecretStoreKeyProvider;
use auth::TokenGenerator;
use auth::TokenPayload;
use auth::VaultSecretStore;
use auth_service::config::Config;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // stdout carries the key-set document only
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "auth_service=debug,auth=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!(
        service = "auth-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        vault_endpoint = %config.vault.endpoint,
        secret_path = %config.vault.secret_path,
        issuer = %config.jwt.issuer,
        audience = %config.jwt.audience,
        validity_secs = config.jwt.validity_secs,
        "Configuration loaded"
    );

    let secret_store = VaultSecretStore::new(config.vault.settings())?;
    let key_provider = SecretStoreKeyProvider::new(secret_store, config.vault.secret_path.as_str())
        .with_fetch_timeout(config.vault.timeout());
    let token_generator = JwtTokenGenerator::new(key_provider, JwtSettings::from(&config.jwt));

    let jwks = token_generator.key_provider().jwks().await?;

    let probe = TokenPayload::new("key-set-probe", "probe@localhost", Vec::new());
    let token = token_generator.generate_token(&probe).await?;
    if !token_generator.validate_token(&token).await? {
        anyhow::bail!("Signing key pair failed self-check: probe token did not verify");
    }

    tracing::info!(
        keys = jwks.keys.len(),
        key_id = %token_generator.key_provider().key_id().await?,
        "Key set verified"
    );

    println!("{}", serde_json::to_string_pretty(&jwks)?);

    Ok(())
}
