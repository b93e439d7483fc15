//! TTL-based distributed locks for Rust.
//!
//! A lock is a single key in a shared store holding the owner's token with
//! an expiry. Acquiring is a "set if absent", releasing is an atomic
//! "delete if it is still mine", and a background renewal keeps extending
//! the expiry while the critical section runs.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ttl_lock::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = RedisLockProvider::builder()
//!         .url("redis://localhost:6379")
//!         .ttl(Duration::from_secs(10))
//!         .renewal_interval(Duration::from_secs(3))
//!         .build()
//!         .await?;
//!
//!     let mut lock = provider.create_lock("job-42");
//!     lock.acquire().await?;
//!     let renewal = lock.start_renewal(provider.renewal_interval())?;
//!
//!     // Critical section - we have exclusive access
//!     println!("Doing critical work...");
//!
//!     // Release the lock; this also stops the renewal
//!     lock.release().await?;
//!     renewal.wait().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Guarantees
//!
//! - Exactly one of several concurrent acquirers of a key succeeds; the rest
//!   get [`LockError::NotAcquired`] immediately. There is no wait queue.
//! - A release never deletes a key holding another owner's token; it fails
//!   with [`LockError::WrongKeyOrOwner`] instead.
//! - No fencing token is handed out: a holder that stalls past its TTL can
//!   overlap with the next holder without noticing.
//!
//! # Crate Organization
//!
//! This is a meta-crate that re-exports types from:
//! - `ttl-lock-core`: lock protocol, store trait, in-memory store
//! - `ttl-lock-redis`: Redis store and provider
//!
//! For fine-grained control, you can depend on individual crates instead.

// Re-export core types and traits
pub use ttl_lock_core::*;

// Re-export redis backend
pub use ttl_lock_redis::*;
