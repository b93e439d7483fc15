//! The lock handle: acquire, release, TTL query and expire.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{Span, field, instrument};

use crate::error::{LockError, LockResult};
use crate::renewal::{Renewal, RenewalSignal, renew_until_cancelled};
use crate::traits::{KeyTtl, LockStore};

/// A TTL lock on one key of a shared store.
///
/// The handle is identified by its key, its ownership token and its TTL.
/// Creating a handle performs no I/O. A handle may be acquired again after a
/// successful release; the second acquisition reuses the same token.
///
/// Mutating operations take `&mut self`, so one handle cannot be driven from
/// two tasks at once without external synchronization.
///
/// # Example
///
/// ```rust,ignore
/// let mut lock = TtlLock::new("job-42", create_lock_id(), Duration::from_secs(10), store);
/// lock.acquire().await?;
/// let renewal = lock.start_renewal(Duration::from_secs(3))?;
/// do_work().await;
/// lock.release().await?;
/// renewal.wait().await?;
/// ```
pub struct TtlLock<S: LockStore> {
    key: String,
    token: String,
    ttl: Duration,
    store: Arc<S>,
    /// Local view of ownership: last acquire succeeded, no release since.
    acquired: bool,
    /// Signal to the running renewal loop, if any.
    cancel: Option<watch::Sender<RenewalSignal>>,
}

impl<S: LockStore> TtlLock<S> {
    /// Creates a handle for `key` owned by `token`.
    pub fn new(
        key: impl Into<String>,
        token: impl Into<String>,
        ttl: Duration,
        store: Arc<S>,
    ) -> Self {
        Self {
            key: key.into(),
            token: token.into(),
            ttl,
            store,
            acquired: false,
            cancel: None,
        }
    }

    /// Returns the key protected by this lock.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the ownership token written to the store on acquire.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the TTL used for acquisition and, by default, renewal.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns `true` if the last acquire succeeded and no release followed.
    ///
    /// This is a local view; the key may have expired in the store since.
    pub fn is_acquired(&self) -> bool {
        self.acquired
    }

    /// Returns `true` while a renewal loop started by this handle has not
    /// been cancelled.
    pub fn is_renewing(&self) -> bool {
        self.cancel.as_ref().is_some_and(|c| !c.is_closed())
    }

    /// Attempts to take the lock without waiting.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The key was absent and now holds this handle's token
    /// * `Err(LockError::NotAcquired)` - The key is already held
    /// * `Err(LockError::Connection | LockError::Backend)` - Store failure;
    ///   the caller must not assume the lock is held
    #[instrument(skip(self), fields(lock.key = %self.key, ttl = ?self.ttl, acquired = field::Empty))]
    pub async fn acquire(&mut self) -> LockResult<()> {
        check_ttl(self.ttl)?;

        let set = self
            .store
            .set_if_absent(&self.key, &self.token, self.ttl)
            .await?;
        Span::current().record("acquired", set);
        self.acquired = set;

        if set {
            Ok(())
        } else {
            Err(LockError::NotAcquired {
                key: self.key.clone(),
            })
        }
    }

    /// Deletes the key if it still holds this handle's token.
    ///
    /// On success the renewal loop, if any, is cancelled and ends with
    /// `Ok(())`, even if it was extending the key when the delete landed.
    /// Releasing a handle that was never acquired, already released, expired,
    /// or taken over by another owner fails with `LockError::WrongKeyOrOwner`
    /// and leaves the store untouched; renewal then keeps running.
    #[instrument(skip(self), fields(lock.key = %self.key, released = field::Empty))]
    pub async fn release(&mut self) -> LockResult<()> {
        let releasing = ReleasingGuard::new(self.cancel.as_ref());
        let deleted = self.store.delete_if_owned(&self.key, &self.token).await?;
        Span::current().record("released", deleted > 0);

        if deleted == 0 {
            return Err(LockError::WrongKeyOrOwner {
                key: self.key.clone(),
            });
        }

        releasing.disarm();
        self.acquired = false;
        self.stop_renewal();
        Ok(())
    }

    /// Reads the remaining TTL of the key as reported by the store.
    #[instrument(skip(self), fields(lock.key = %self.key))]
    pub async fn remaining_ttl(&self) -> LockResult<KeyTtl> {
        self.store.ttl(&self.key).await
    }

    /// Resets the key's TTL to `ttl` without checking ownership.
    ///
    /// Returns whether the key existed. Callers relying on this for safety
    /// must pair it with their own ownership discipline.
    #[instrument(skip(self), fields(lock.key = %self.key))]
    pub async fn expire(&self, ttl: Duration) -> LockResult<bool> {
        check_ttl(ttl)?;
        self.store.set_expiry(&self.key, ttl).await
    }

    /// Starts a background task extending the key's TTL every `interval`.
    ///
    /// The handle must be acquired. A loop already running for this handle
    /// is cancelled first. Must be called from within a tokio runtime.
    ///
    /// The returned [`Renewal`] reports how the loop ended: `Ok(())` after
    /// cancellation, `LockError::RenewalLost` if the key disappeared, or the
    /// store error that stopped it.
    pub fn start_renewal(&mut self, interval: Duration) -> LockResult<Renewal> {
        self.start_renewal_with_ttl(self.ttl, interval)
    }

    /// Like [`start_renewal`](Self::start_renewal), but each extension resets
    /// the key to `ttl` instead of the handle's acquire TTL.
    pub fn start_renewal_with_ttl(
        &mut self,
        ttl: Duration,
        interval: Duration,
    ) -> LockResult<Renewal> {
        if interval.is_zero() {
            return Err(LockError::InvalidConfig(
                "renewal interval must be non-zero".to_string(),
            ));
        }
        check_ttl(ttl)?;
        if !self.acquired {
            return Err(LockError::WrongKeyOrOwner {
                key: self.key.clone(),
            });
        }

        self.stop_renewal();

        let (cancel_sender, cancel_receiver) = watch::channel(RenewalSignal::Running);
        let (lost_sender, lost_receiver) = watch::channel(false);

        let task = tokio::spawn(renew_until_cancelled(
            self.store.clone(),
            self.key.clone(),
            ttl,
            interval,
            cancel_receiver,
            lost_sender,
        ));

        self.cancel = Some(cancel_sender);
        Ok(Renewal::new(self.key.clone(), lost_receiver, task))
    }

    /// Cancels the running renewal loop without touching the store.
    ///
    /// Returns `false` if no loop was running. The signal is taken out of
    /// the handle, so it can only ever be fired once.
    pub fn stop_renewal(&mut self) -> bool {
        match self.cancel.take() {
            Some(cancel) => {
                cancel.send_replace(RenewalSignal::Cancelled);
                true
            }
            None => false,
        }
    }
}

impl<S: LockStore> Drop for TtlLock<S> {
    fn drop(&mut self) {
        // The key is left to expire; release() must be awaited to delete it.
        self.stop_renewal();
    }
}

impl<S: LockStore> std::fmt::Debug for TtlLock<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlLock")
            .field("key", &self.key)
            .field("token", &self.token)
            .field("ttl", &self.ttl)
            .field("acquired", &self.acquired)
            .field("renewing", &self.is_renewing())
            .finish()
    }
}

/// Marks a release in flight for the renewal loop.
///
/// Unless disarmed, dropping it puts the loop back to `Running`, which covers
/// a failed delete as well as a release future dropped mid-flight.
struct ReleasingGuard<'a> {
    signal: Option<&'a watch::Sender<RenewalSignal>>,
}

impl<'a> ReleasingGuard<'a> {
    fn new(signal: Option<&'a watch::Sender<RenewalSignal>>) -> Self {
        if let Some(signal) = signal {
            signal.send_replace(RenewalSignal::Releasing);
        }
        Self { signal }
    }

    fn disarm(mut self) {
        self.signal = None;
    }
}

impl Drop for ReleasingGuard<'_> {
    fn drop(&mut self) {
        if let Some(signal) = self.signal {
            signal.send_replace(RenewalSignal::Running);
        }
    }
}

/// Stores work in whole milliseconds; anything shorter would round to zero.
pub(crate) fn check_ttl(ttl: Duration) -> LockResult<()> {
    if ttl.as_millis() == 0 {
        return Err(LockError::InvalidConfig(format!(
            "ttl must be at least 1ms, got {ttl:?}"
        )));
    }
    Ok(())
}
