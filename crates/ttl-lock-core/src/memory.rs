//! In-process store for tests and single-process use.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{LockError, LockResult};
use crate::lock::TtlLock;
use crate::traits::{KeyTtl, LockProvider, LockStore};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// A [`LockStore`] kept in process memory.
///
/// Every operation runs under one mutex, which makes each of them atomic.
/// Expiry follows the tokio clock, so tests can drive it with
/// `tokio::time::pause` and `advance`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with `LockError::Connection` while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Returns the live value stored under `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        self.entries()
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value.clone())
    }

    /// Stores `value` under `key` without expiry, replacing any holder.
    pub fn insert(&self, key: &str, value: &str) {
        self.entries().insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: None,
            },
        );
    }

    /// Deletes `key` unconditionally. Returns whether a live key was removed.
    pub fn remove(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries()
            .remove(key)
            .is_some_and(|e| e.is_live(now))
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        // Entries are replaced whole, so a poisoned map is still consistent.
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn check_available(&self) -> LockResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(LockError::Connection(Box::new(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "memory store is unavailable",
            ))));
        }
        Ok(())
    }

    /// Returns the live entry for `key`, dropping it first if it has expired.
    fn live_entry<'a>(
        entries: &'a mut HashMap<String, Entry>,
        key: &str,
        now: Instant,
    ) -> Option<&'a mut Entry> {
        if entries.get(key).is_some_and(|e| !e.is_live(now)) {
            entries.remove(key);
        }
        entries.get_mut(key)
    }
}

impl LockStore for MemoryStore {
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> LockResult<bool> {
        self.check_available()?;
        let now = Instant::now();
        let mut entries = self.entries();

        if Self::live_entry(&mut entries, key, now).is_some() {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(now + ttl),
            },
        );
        Ok(true)
    }

    async fn ttl(&self, key: &str) -> LockResult<KeyTtl> {
        self.check_available()?;
        let now = Instant::now();
        let mut entries = self.entries();

        Ok(match Self::live_entry(&mut entries, key, now) {
            None => KeyTtl::Missing,
            Some(Entry {
                expires_at: None, ..
            }) => KeyTtl::Persistent,
            Some(Entry {
                expires_at: Some(at),
                ..
            }) => KeyTtl::Expires(at.saturating_duration_since(now)),
        })
    }

    async fn set_expiry(&self, key: &str, ttl: Duration) -> LockResult<bool> {
        self.check_available()?;
        let now = Instant::now();
        let mut entries = self.entries();

        match Self::live_entry(&mut entries, key, now) {
            Some(entry) => {
                entry.expires_at = Some(now + ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_if_owned(&self, key: &str, expected: &str) -> LockResult<u64> {
        self.check_available()?;
        let now = Instant::now();
        let mut entries = self.entries();

        let owned = Self::live_entry(&mut entries, key, now).is_some_and(|e| e.value == expected);
        if owned {
            entries.remove(key);
            Ok(1)
        } else {
            Ok(0)
        }
    }
}

/// Provider for locks backed by a shared [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemoryLockProvider {
    store: Arc<MemoryStore>,
    ttl: Duration,
}

impl MemoryLockProvider {
    /// Creates a provider over a fresh store with the given default TTL.
    pub fn new(ttl: Duration) -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), ttl)
    }

    /// Creates a provider over an existing store.
    pub fn with_store(store: Arc<MemoryStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Returns the backing store.
    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }
}

impl LockProvider for MemoryLockProvider {
    type Store = MemoryStore;

    fn create_lock_with_token(&self, key: &str, token: impl Into<String>) -> TtlLock<MemoryStore> {
        TtlLock::new(key, token, self.ttl, self.store.clone())
    }
}
