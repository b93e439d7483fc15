//! Core types and protocol for TTL-based distributed locks.
//!
//! A [`TtlLock`] guards one key of a shared [`LockStore`]: acquiring writes
//! the handle's ownership token only if the key is absent, releasing deletes
//! the key only if it still holds that token, and an optional background
//! [`Renewal`] keeps extending the key's TTL while the critical section runs.

pub mod error;
pub mod lock;
pub mod memory;
pub mod prelude;
pub mod renewal;
pub mod token;
pub mod traits;

pub use error::{LockError, LockResult};
pub use prelude::*;
