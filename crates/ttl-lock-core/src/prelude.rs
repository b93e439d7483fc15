//! Convenience prelude for TTL lock types.

pub use crate::error::{LockError, LockResult};
pub use crate::lock::TtlLock;
pub use crate::memory::{MemoryLockProvider, MemoryStore};
pub use crate::renewal::Renewal;
pub use crate::token::create_lock_id;
pub use crate::traits::{KeyTtl, LockProvider, LockProviderExt, LockStore};
