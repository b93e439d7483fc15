//! Core traits for TTL locks.

use std::future::Future;
use std::time::Duration;

use crate::error::LockResult;
use crate::lock::TtlLock;
use crate::token::create_lock_id;

// ============================================================================
// Store Trait
// ============================================================================

/// Remaining lifetime of a key as reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    /// The key exists and expires after this duration.
    Expires(Duration),
    /// The key exists but carries no expiry.
    Persistent,
    /// The key does not exist.
    Missing,
}

impl KeyTtl {
    /// Returns the remaining duration, if the key exists and expires.
    pub fn remaining(&self) -> Option<Duration> {
        match self {
            Self::Expires(d) => Some(*d),
            Self::Persistent | Self::Missing => None,
        }
    }

    /// Returns `true` if the key exists in the store.
    pub fn exists(&self) -> bool {
        !matches!(self, Self::Missing)
    }
}

/// Key-value store primitives the lock protocol is built on.
///
/// Implementations must be safe for concurrent use by many lock handles.
/// Every method is a single round-trip; implementations should not retry.
///
/// # Example
///
/// ```rust,ignore
/// let store = Arc::new(MemoryStore::new());
/// assert!(store.set_if_absent("job-42", "abc", Duration::from_secs(10)).await?);
/// assert_eq!(store.delete_if_owned("job-42", "abc").await?, 1);
/// ```
pub trait LockStore: Send + Sync + 'static {
    /// Sets `key` to `value` with expiry `ttl`, only if `key` does not exist.
    ///
    /// Returns whether the key was set.
    fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> impl Future<Output = LockResult<bool>> + Send;

    /// Reads the remaining time-to-live of `key`.
    fn ttl(&self, key: &str) -> impl Future<Output = LockResult<KeyTtl>> + Send;

    /// Resets the expiry of `key` to `ttl`, regardless of its value.
    ///
    /// Returns whether the key existed and was updated.
    fn set_expiry(&self, key: &str, ttl: Duration) -> impl Future<Output = LockResult<bool>> + Send;

    /// Deletes `key` if and only if its value equals `expected`.
    ///
    /// The comparison and deletion must be a single atomic operation on the
    /// store. Returns the number of keys deleted (0 or 1).
    fn delete_if_owned(
        &self,
        key: &str,
        expected: &str,
    ) -> impl Future<Output = LockResult<u64>> + Send;
}

// ============================================================================
// Provider Traits
// ============================================================================

/// Factory for lock handles sharing one store and a default TTL.
///
/// # Example
///
/// ```rust,ignore
/// // Configure once at startup
/// let provider = RedisLockProvider::new("redis://localhost:6379").await?;
///
/// // Create locks by key anywhere in the application
/// let mut lock = provider.create_lock("job-42");
/// lock.acquire().await?;
/// ```
pub trait LockProvider: Send + Sync {
    /// The store backing the locks created by this provider.
    type Store: LockStore;

    /// Creates a handle for `key` owned by the given token.
    fn create_lock_with_token(&self, key: &str, token: impl Into<String>) -> TtlLock<Self::Store>;

    /// Creates a handle for `key` with a freshly generated token.
    fn create_lock(&self, key: &str) -> TtlLock<Self::Store> {
        self.create_lock_with_token(key, create_lock_id())
    }
}

// ============================================================================
// Convenience Extensions
// ============================================================================

/// Extension trait providing convenience methods for lock providers.
pub trait LockProviderExt: LockProvider {
    /// Creates a handle for `key` and acquires it.
    ///
    /// Fails with `LockError::NotAcquired` if the key is already held.
    fn try_acquire_lock(
        &self,
        key: &str,
    ) -> impl Future<Output = LockResult<TtlLock<Self::Store>>> + Send
    where
        Self: Sync,
    {
        async move {
            let mut lock = self.create_lock(key);
            lock.acquire().await?;
            Ok(lock)
        }
    }
}

// Blanket implementation for all LockProviders
impl<T: LockProvider> LockProviderExt for T {}
