//! Redis lock provider implementation.

use std::sync::Arc;
use std::time::Duration;

use fred::prelude::*;
use ttl_lock_core::error::{LockError, LockResult};
use ttl_lock_core::lock::TtlLock;
use ttl_lock_core::traits::LockProvider;

use crate::store::RedisLockStore;

/// Builder for Redis lock provider configuration.
///
/// # Example
///
/// ```rust,ignore
/// let provider = RedisLockProvider::builder()
///     .url("redis://localhost:6379")
///     .ttl(Duration::from_secs(10))
///     .renewal_interval(Duration::from_secs(3))
///     .build()
///     .await?;
/// ```
pub struct RedisLockProviderBuilder {
    url: Option<String>,
    client: Option<RedisClient>,
    ttl: Duration,
    renewal_interval: Duration,
    key_prefix: String,
}

impl RedisLockProviderBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            url: None,
            client: None,
            ttl: Duration::from_secs(30),
            renewal_interval: Duration::from_secs(10),
            key_prefix: String::new(),
        }
    }

    /// Sets the Redis server URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Uses an existing Redis client. Takes precedence over [`url`](Self::url).
    pub fn client(mut self, client: RedisClient) -> Self {
        self.client = Some(client);
        self
    }

    /// Sets the TTL given to locks created by the provider.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the suggested renewal interval.
    ///
    /// Must be shorter than the TTL, otherwise keys expire between renewals.
    pub fn renewal_interval(mut self, interval: Duration) -> Self {
        self.renewal_interval = interval;
        self
    }

    /// Sets a prefix prepended to every lock key.
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Builds the provider, connecting to the server if a URL was given.
    ///
    /// # Errors
    ///
    /// Returns `LockError::InvalidConfig` for unusable timings or when neither
    /// a client nor a URL is set, and `LockError::Connection` if the server
    /// cannot be reached.
    pub async fn build(self) -> LockResult<RedisLockProvider> {
        if self.ttl.as_millis() == 0 {
            return Err(LockError::InvalidConfig(format!(
                "ttl must be at least 1ms, got {:?}",
                self.ttl
            )));
        }
        if self.renewal_interval.is_zero() || self.renewal_interval >= self.ttl {
            return Err(LockError::InvalidConfig(format!(
                "renewal interval {:?} must be non-zero and shorter than ttl {:?}",
                self.renewal_interval, self.ttl
            )));
        }

        let client = match (self.client, self.url) {
            (Some(client), _) => client,
            (None, Some(url)) => connect(&url).await?,
            (None, None) => {
                return Err(LockError::InvalidConfig(
                    "no Redis client or URL provided".to_string(),
                ));
            }
        };

        Ok(RedisLockProvider {
            store: Arc::new(RedisLockStore::new(client)),
            ttl: self.ttl,
            renewal_interval: self.renewal_interval,
            key_prefix: self.key_prefix,
        })
    }
}

impl Default for RedisLockProviderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

async fn connect(url: &str) -> LockResult<RedisClient> {
    let config = RedisConfig::from_url(url).map_err(|e| {
        LockError::Connection(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid Redis URL: {}", e),
        )))
    })?;

    let client = RedisClient::new(config, None, None, None);
    client.connect();
    client.wait_for_connect().await.map_err(|e| {
        LockError::Connection(Box::new(std::io::Error::other(format!(
            "failed to connect to Redis: {}",
            e
        ))))
    })?;

    Ok(client)
}

/// Provider for Redis-backed TTL locks.
///
/// All locks created by one provider share a single client.
pub struct RedisLockProvider {
    store: Arc<RedisLockStore>,
    ttl: Duration,
    renewal_interval: Duration,
    key_prefix: String,
}

impl RedisLockProvider {
    /// Returns a new builder for configuring the provider.
    pub fn builder() -> RedisLockProviderBuilder {
        RedisLockProviderBuilder::new()
    }

    /// Creates a provider using the specified Redis URL and default timings.
    pub async fn new(url: impl Into<String>) -> LockResult<Self> {
        Self::builder().url(url).build().await
    }

    /// Returns the shared store.
    pub fn store(&self) -> &Arc<RedisLockStore> {
        &self.store
    }

    /// Returns the TTL given to new locks.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the configured renewal interval, for use with
    /// [`TtlLock::start_renewal`].
    pub fn renewal_interval(&self) -> Duration {
        self.renewal_interval
    }

    /// Returns the store key used for `name`.
    pub fn key_for(&self, name: &str) -> String {
        format!("{}{}", self.key_prefix, name)
    }
}

impl LockProvider for RedisLockProvider {
    type Store = RedisLockStore;

    fn create_lock_with_token(&self, key: &str, token: impl Into<String>) -> TtlLock<RedisLockStore> {
        TtlLock::new(self.key_for(key), token, self.ttl, self.store.clone())
    }
}
