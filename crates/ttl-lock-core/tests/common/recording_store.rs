//! Store wrapper counting calls, for asserting what the protocol sends.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use ttl_lock_core::prelude::*;

/// Wraps a [`MemoryStore`] and counts each primitive call.
#[derive(Debug, Default)]
pub struct RecordingStore {
    pub inner: MemoryStore,
    pub set_if_absent_calls: AtomicUsize,
    pub set_expiry_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
}

impl RecordingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn extensions(&self) -> usize {
        self.set_expiry_calls.load(Ordering::SeqCst)
    }
}

impl LockStore for RecordingStore {
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> LockResult<bool> {
        self.set_if_absent_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.set_if_absent(key, value, ttl).await
    }

    async fn ttl(&self, key: &str) -> LockResult<KeyTtl> {
        self.inner.ttl(key).await
    }

    async fn set_expiry(&self, key: &str, ttl: Duration) -> LockResult<bool> {
        self.set_expiry_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.set_expiry(key, ttl).await
    }

    async fn delete_if_owned(&self, key: &str, expected: &str) -> LockResult<u64> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.delete_if_owned(key, expected).await
    }
}

