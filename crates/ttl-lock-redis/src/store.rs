//! Redis implementation of the lock store primitives.

use std::time::Duration;

use fred::prelude::*;
use fred::types::CustomCommand;
use tracing::{debug, instrument};
use ttl_lock_core::error::{LockError, LockResult};
use ttl_lock_core::traits::{KeyTtl, LockStore};

/// Lua script deleting the key only while it still holds the caller's token.
const RELEASE_SCRIPT_LUA: &str = r#"
    if redis.call('get', KEYS[1]) == ARGV[1] then
        return redis.call('del', KEYS[1])
    end
    return 0
"#;

/// A [`LockStore`] over a single Redis server.
///
/// Cloning is cheap; clones share the underlying connection.
#[derive(Clone)]
pub struct RedisLockStore {
    client: RedisClient,
}

impl RedisLockStore {
    /// Wraps a connected client.
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &RedisClient {
        &self.client
    }
}

impl LockStore for RedisLockStore {
    #[instrument(skip(self, value), fields(backend = "redis"))]
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> LockResult<bool> {
        // SET NX returns Some(value) if key was set, None if key already exists
        let result: Option<String> = self
            .client
            .set(
                key,
                value,
                Some(Expiration::PX(millis(ttl))),
                Some(SetOptions::NX),
                false,
            )
            .await
            .map_err(|e| store_error("SET NX", e))?;

        Ok(result.is_some())
    }

    #[instrument(skip(self), fields(backend = "redis"))]
    async fn ttl(&self, key: &str) -> LockResult<KeyTtl> {
        let result: i64 = self
            .client
            .pttl(key)
            .await
            .map_err(|e| store_error("PTTL", e))?;

        Ok(key_ttl_from_millis(result))
    }

    #[instrument(skip(self), fields(backend = "redis"))]
    async fn set_expiry(&self, key: &str, ttl: Duration) -> LockResult<bool> {
        let extended: bool = self
            .client
            .pexpire(key, millis(ttl), None)
            .await
            .map_err(|e| store_error("PEXPIRE", e))?;

        Ok(extended)
    }

    #[instrument(skip(self, expected), fields(backend = "redis"))]
    async fn delete_if_owned(&self, key: &str, expected: &str) -> LockResult<u64> {
        let args: Vec<RedisValue> = vec![
            RELEASE_SCRIPT_LUA.into(),
            1_i64.into(), // numkeys
            key.into(),
            expected.into(),
        ];

        let cmd = CustomCommand::new_static("EVAL", None, false);

        let deleted: i64 = self
            .client
            .custom(cmd, args)
            .await
            .map_err(|e| store_error("EVAL (release)", e))?;

        Ok(deleted.max(0) as u64)
    }
}

/// Maps a PTTL reply: -2 for a missing key, -1 for a key without expiry.
fn key_ttl_from_millis(reply: i64) -> KeyTtl {
    match reply {
        -2 => KeyTtl::Missing,
        ms if ms < 0 => KeyTtl::Persistent,
        ms => KeyTtl::Expires(Duration::from_millis(ms as u64)),
    }
}

fn millis(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)
}

/// Classifies a fred error, keeping it as the source so callers can downcast.
fn store_error(op: &str, e: RedisError) -> LockError {
    debug!(op, error = %e, "Redis command failed");
    match e.kind() {
        RedisErrorKind::IO | RedisErrorKind::Timeout | RedisErrorKind::Canceled => {
            LockError::Connection(Box::new(e))
        }
        _ => LockError::Backend(Box::new(e)),
    }
}
