//! Store wrapper whose delete reply arrives late, like a slow round-trip.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use ttl_lock_core::prelude::*;

/// Wraps a [`MemoryStore`]; `delete_if_owned` applies at once but replies
/// after `reply_delay`.
#[derive(Debug)]
pub struct DelayedDeleteStore {
    pub inner: MemoryStore,
    pub reply_delay: Duration,
}

impl DelayedDeleteStore {
    pub fn new(reply_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStore::new(),
            reply_delay,
        })
    }
}

impl LockStore for DelayedDeleteStore {
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> LockResult<bool> {
        self.inner.set_if_absent(key, value, ttl).await
    }

    async fn ttl(&self, key: &str) -> LockResult<KeyTtl> {
        self.inner.ttl(key).await
    }

    async fn set_expiry(&self, key: &str, ttl: Duration) -> LockResult<bool> {
        self.inner.set_expiry(key, ttl).await
    }

    async fn delete_if_owned(&self, key: &str, expected: &str) -> LockResult<u64> {
        let deleted = self.inner.delete_if_owned(key, expected).await;
        tokio::time::sleep(self.reply_delay).await;
        deleted
    }
}
