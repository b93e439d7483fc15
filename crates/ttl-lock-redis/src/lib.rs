//! Redis backend for TTL locks.
//!
//! Keys are created with `SET NX PX`, renewed with `PEXPIRE`, inspected with
//! `PTTL` and released through a Lua script that deletes the key only while
//! it still holds the releasing handle's token.

pub mod provider;
pub mod store;

pub use provider::{RedisLockProvider, RedisLockProviderBuilder};
pub use store::RedisLockStore;
