use std::sync::Arc;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::future::Shared;
use futures::FutureExt;
use tokio::sync::Mutex;

use super::errors::KeyError;
use super::jwks::Jwks;
use super::material::KeyMaterial;
use super::secret_store::SecretStore;

/// Secret field holding the PEM-encoded private key.
pub const PRIVATE_KEY_FIELD: &str = "private_key";

/// Secret field holding the PEM-encoded public key.
pub const PUBLIC_KEY_FIELD: &str = "public_key";

/// Default upper bound on a single secret-store round trip.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Source of signing and verification keys.
///
/// All accessors are backed by one [`KeyMaterial`], so the private key,
/// public key and key id returned by a provider always belong together.
#[async_trait]
pub trait KeyProvider: Send + Sync + 'static {
    /// Resolve the current key pair.
    ///
    /// # Errors
    /// * `KeyError` - Keys could not be fetched or are invalid
    async fn key_material(&self) -> Result<Arc<KeyMaterial>, KeyError>;

    async fn private_key(&self) -> Result<String, KeyError> {
        Ok(self.key_material().await?.private_key_pem().to_string())
    }

    async fn public_key(&self) -> Result<String, KeyError> {
        Ok(self.key_material().await?.public_key_pem().to_string())
    }

    async fn key_id(&self) -> Result<String, KeyError> {
        Ok(self.key_material().await?.key_id().to_string())
    }

    /// Key-set document listing every public key this provider holds.
    async fn jwks(&self) -> Result<Jwks, KeyError> {
        let material = self.key_material().await?;
        Ok(Jwks {
            keys: vec![material.to_jwk()],
        })
    }
}

type SharedFetch = Shared<BoxFuture<'static, Result<Arc<KeyMaterial>, KeyError>>>;

/// Key provider that reads the key pair from a [`SecretStore`] once and
/// caches it for the lifetime of the instance.
///
/// Concurrent callers join the fetch already in flight and share its
/// outcome, success or failure. A failed fetch leaves the cache empty so the
/// next call starts a new one; there is no partial state where only one half
/// of the pair is cached.
pub struct SecretStoreKeyProvider<S: SecretStore> {
    store: Arc<S>,
    secret_path: String,
    fetch_timeout: Duration,
    cache: OnceLock<Arc<KeyMaterial>>,
    in_flight: Mutex<Option<SharedFetch>>,
}

impl<S: SecretStore> SecretStoreKeyProvider<S> {
    /// Create a provider reading the secret at `secret_path`.
    pub fn new(store: S, secret_path: impl Into<String>) -> Self {
        Self {
            store: Arc::new(store),
            secret_path: secret_path.into(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            cache: OnceLock::new(),
            in_flight: Mutex::new(None),
        }
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    /// Whether the key pair has already been fetched.
    pub fn is_cached(&self) -> bool {
        self.cache.get().is_some()
    }

    fn start_fetch(&self) -> SharedFetch {
        fetch_key_material(
            Arc::clone(&self.store),
            self.secret_path.clone(),
            self.fetch_timeout,
        )
        .boxed()
        .shared()
    }
}

async fn fetch_key_material<S: SecretStore>(
    store: Arc<S>,
    secret_path: String,
    fetch_timeout: Duration,
) -> Result<Arc<KeyMaterial>, KeyError> {
    tracing::debug!(secret_path = %secret_path, "Fetching signing keys");

    let result = read_key_material(store.as_ref(), &secret_path, fetch_timeout).await;

    match &result {
        Ok(material) => tracing::info!(
            key_id = %material.key_id(),
            secret_path = %secret_path,
            "Signing keys cached"
        ),
        Err(e) => tracing::error!(
            error = %e,
            secret_path = %secret_path,
            "Failed to load signing keys"
        ),
    }

    result
}

async fn read_key_material<S: SecretStore>(
    store: &S,
    secret_path: &str,
    fetch_timeout: Duration,
) -> Result<Arc<KeyMaterial>, KeyError> {
    let secret = tokio::time::timeout(fetch_timeout, store.read(secret_path))
        .await
        .map_err(|_| {
            KeyError::Unavailable(format!(
                "Secret store did not answer within {:?}",
                fetch_timeout
            ))
        })??;

    let private_key = secret
        .get(PRIVATE_KEY_FIELD)
        .ok_or_else(|| KeyError::MissingField(PRIVATE_KEY_FIELD.to_string()))?;
    let public_key = secret
        .get(PUBLIC_KEY_FIELD)
        .ok_or_else(|| KeyError::MissingField(PUBLIC_KEY_FIELD.to_string()))?;

    Ok(Arc::new(KeyMaterial::from_pem(private_key, public_key)?))
}

#[async_trait]
impl<S: SecretStore> KeyProvider for SecretStoreKeyProvider<S> {
    async fn key_material(&self) -> Result<Arc<KeyMaterial>, KeyError> {
        if let Some(material) = self.cache.get() {
            return Ok(Arc::clone(material));
        }

        let fetch = {
            let mut in_flight = self.in_flight.lock().await;
            if let Some(material) = self.cache.get() {
                return Ok(Arc::clone(material));
            }
            in_flight
                .get_or_insert_with(|| self.start_fetch())
                .clone()
        };

        let result = fetch.clone().await;

        // Publish and retire under one lock; no new fetch may start in between.
        let mut in_flight = self.in_flight.lock().await;
        if let Ok(material) = &result {
            let _ = self.cache.set(Arc::clone(material));
        }
        if in_flight.as_ref().is_some_and(|current| current.ptr_eq(&fetch)) {
            *in_flight = None;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::keys::derive_key_id;
    use crate::testutil::key_pair_secret;
    use crate::testutil::TEST_PRIVATE_KEY_PEM;
    use crate::testutil::TEST_PUBLIC_KEY_PEM;

    const SECRET_PATH: &str = "secret/data/auth/jwt";

    /// Secret store that counts reads and answers after a short delay.
    struct CountingStore {
        data: Option<HashMap<String, String>>,
        delay: Duration,
        reads: Arc<AtomicUsize>,
    }

    impl CountingStore {
        fn new(data: Option<HashMap<String, String>>) -> (Self, Arc<AtomicUsize>) {
            let reads = Arc::new(AtomicUsize::new(0));
            let store = Self {
                data,
                delay: Duration::from_millis(50),
                reads: Arc::clone(&reads),
            };
            (store, reads)
        }
    }

    #[async_trait]
    impl SecretStore for CountingStore {
        async fn read(&self, _path: &str) -> Result<HashMap<String, String>, KeyError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.data
                .clone()
                .ok_or_else(|| KeyError::Unavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_accessors_share_one_fetch() {
        let (store, reads) = CountingStore::new(Some(key_pair_secret(
            TEST_PRIVATE_KEY_PEM,
            TEST_PUBLIC_KEY_PEM,
        )));
        let provider = SecretStoreKeyProvider::new(store, SECRET_PATH);

        assert!(!provider.is_cached());
        let private_key = provider.private_key().await.expect("private key");
        let public_key = provider.public_key().await.expect("public key");
        let key_id = provider.key_id().await.expect("key id");

        assert_eq!(private_key, TEST_PRIVATE_KEY_PEM);
        assert_eq!(public_key, TEST_PUBLIC_KEY_PEM);
        assert_eq!(key_id, derive_key_id(TEST_PUBLIC_KEY_PEM));
        assert!(provider.is_cached());
        assert_eq!(reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_calls_fetch_once() {
        let (store, reads) = CountingStore::new(Some(key_pair_secret(
            TEST_PRIVATE_KEY_PEM,
            TEST_PUBLIC_KEY_PEM,
        )));
        let provider = Arc::new(SecretStoreKeyProvider::new(store, SECRET_PATH));

        let first = {
            let provider = Arc::clone(&provider);
            tokio::spawn(async move { provider.private_key().await })
        };
        let second = {
            let provider = Arc::clone(&provider);
            tokio::spawn(async move { provider.public_key().await })
        };
        let third = {
            let provider = Arc::clone(&provider);
            tokio::spawn(async move { provider.key_material().await })
        };

        let private_key = first.await.expect("join").expect("private key");
        let public_key = second.await.expect("join").expect("public key");
        let material = third.await.expect("join").expect("material");

        assert_eq!(reads.load(Ordering::SeqCst), 1);
        assert_eq!(private_key, material.private_key_pem());
        assert_eq!(public_key, material.public_key_pem());
        assert!(KeyMaterial::from_pem(&private_key, &public_key).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_store_is_unavailable_and_not_cached() {
        let (store, reads) = CountingStore::new(None);
        let provider = SecretStoreKeyProvider::new(store, SECRET_PATH);

        let result = provider.key_id().await;
        assert!(matches!(result, Err(KeyError::Unavailable(_))));
        assert!(!provider.is_cached());

        // No automatic retry inside a call; the next call fetches again.
        let _ = provider.key_id().await;
        assert_eq!(reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_failed_fetch() {
        let (mut store, reads) = CountingStore::new(Some(key_pair_secret(
            TEST_PRIVATE_KEY_PEM,
            TEST_PUBLIC_KEY_PEM,
        )));
        store.delay = Duration::from_secs(10);
        let fetch_timeout = Duration::from_millis(200);
        let provider = Arc::new(
            SecretStoreKeyProvider::new(store, SECRET_PATH).with_fetch_timeout(fetch_timeout),
        );

        let started = tokio::time::Instant::now();
        let callers: Vec<_> = (0..5)
            .map(|_| {
                let provider = Arc::clone(&provider);
                tokio::spawn(async move {
                    let result = provider.key_id().await;
                    (result, started.elapsed())
                })
            })
            .collect();

        for caller in callers {
            let (result, elapsed) = caller.await.expect("join");
            assert!(matches!(result, Err(KeyError::Unavailable(_))));
            assert!(elapsed < fetch_timeout * 3, "caller waited {:?}", elapsed);
        }

        assert_eq!(reads.load(Ordering::SeqCst), 1);
        assert!(!provider.is_cached());

        // The outage is not remembered; the next call reads again.
        let _ = provider.key_id().await;
        assert_eq!(reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_missing_field_fails_without_partial_cache() {
        let mut data = HashMap::new();
        data.insert(
            PRIVATE_KEY_FIELD.to_string(),
            TEST_PRIVATE_KEY_PEM.to_string(),
        );
        let (store, _) = CountingStore::new(Some(data));
        let provider = SecretStoreKeyProvider::new(store, SECRET_PATH);

        let result = provider.private_key().await;
        assert!(matches!(result, Err(KeyError::MissingField(field)) if field == PUBLIC_KEY_FIELD));
        assert!(!provider.is_cached());
    }

    #[tokio::test]
    async fn test_slow_store_times_out() {
        let (mut store, _) = CountingStore::new(Some(key_pair_secret(
            TEST_PRIVATE_KEY_PEM,
            TEST_PUBLIC_KEY_PEM,
        )));
        store.delay = Duration::from_millis(500);
        let provider = SecretStoreKeyProvider::new(store, SECRET_PATH)
            .with_fetch_timeout(Duration::from_millis(20));

        let result = provider.key_material().await;
        assert!(matches!(result, Err(KeyError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_instances_are_isolated() {
        let (first_store, first_reads) = CountingStore::new(Some(key_pair_secret(
            TEST_PRIVATE_KEY_PEM,
            TEST_PUBLIC_KEY_PEM,
        )));
        let (second_store, second_reads) = CountingStore::new(None);

        let first = SecretStoreKeyProvider::new(first_store, SECRET_PATH);
        let second = SecretStoreKeyProvider::new(second_store, SECRET_PATH);

        assert!(first.key_material().await.is_ok());
        assert!(second.key_material().await.is_err());
        assert_eq!(first_reads.load(Ordering::SeqCst), 1);
        assert_eq!(second_reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_jwks_lists_cached_key() {
        let (store, _) = CountingStore::new(Some(key_pair_secret(
            TEST_PRIVATE_KEY_PEM,
            TEST_PUBLIC_KEY_PEM,
        )));
        let provider = SecretStoreKeyProvider::new(store, SECRET_PATH);

        let jwks = provider.jwks().await.expect("jwks");
        assert_eq!(jwks.keys.len(), 1);
        assert_eq!(jwks.keys[0].kid, derive_key_id(TEST_PUBLIC_KEY_PEM));
    }
}
