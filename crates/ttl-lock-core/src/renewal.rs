//! Background TTL renewal.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, instrument, warn};

use crate::error::{LockError, LockResult};
use crate::traits::LockStore;

/// State published by a lock handle to its renewal loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RenewalSignal {
    Running,
    /// A release has been sent; the key may vanish before it returns.
    Releasing,
    Cancelled,
}

/// Handle to a running renewal loop.
///
/// Dropping it detaches the loop; the loop keeps running until the lock
/// handle that started it is released, stops renewal, or is dropped.
#[derive(Debug)]
pub struct Renewal {
    key: String,
    lost_receiver: watch::Receiver<bool>,
    task: JoinHandle<LockResult<()>>,
}

impl Renewal {
    pub(crate) fn new(
        key: String,
        lost_receiver: watch::Receiver<bool>,
        task: JoinHandle<LockResult<()>>,
    ) -> Self {
        Self {
            key,
            lost_receiver,
            task,
        }
    }

    /// Returns the key being renewed.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns a receiver that flips to `true` when renewal fails.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let mut lost = renewal.lost_token().clone();
    /// tokio::select! {
    ///     _ = lost.wait_for(|lost| *lost) => {
    ///         eprintln!("Lock was lost!");
    ///     }
    ///     _ = do_work() => {
    ///         // Work completed while still holding lock
    ///     }
    /// }
    /// ```
    pub fn lost_token(&self) -> &watch::Receiver<bool> {
        &self.lost_receiver
    }

    /// Returns `true` once the loop has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the loop to exit and returns its outcome.
    ///
    /// `Ok(())` means the loop was cancelled. Any error means the lock is no
    /// longer protected and the critical section must be abandoned.
    pub async fn wait(self) -> LockResult<()> {
        self.task.await.map_err(LockError::RenewalTask)?
    }
}

/// Extends `key` to `ttl` every `interval` until cancelled or an extension fails.
///
/// The first extension happens one `interval` after start.
#[instrument(skip_all, fields(lock.key = %key, ttl = ?ttl, interval = ?interval))]
pub(crate) async fn renew_until_cancelled<S: LockStore>(
    store: Arc<S>,
    key: String,
    ttl: Duration,
    interval: Duration,
    mut cancel: watch::Receiver<RenewalSignal>,
    lost: watch::Sender<bool>,
) -> LockResult<()> {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;

            changed = cancel.changed() => {
                // A dropped sender means the owning handle is gone.
                if changed.is_err() || *cancel.borrow_and_update() == RenewalSignal::Cancelled {
                    debug!("renewal cancelled");
                    return Ok(());
                }
            }
            _ = ticker.tick() => {
                let outcome = store.set_expiry(&key, ttl).await;

                let failed = !matches!(outcome, Ok(true));
                if failed && settle_release(&mut cancel).await == RenewalSignal::Cancelled {
                    // The owning release deleted the key under this extension.
                    debug!("renewal cancelled during extension");
                    return Ok(());
                }

                match outcome {
                    Ok(true) => {
                        debug!("lock extended");
                    }
                    Ok(false) => {
                        lost.send_replace(true);
                        warn!("lock key missing, renewal stopped");
                        return Err(LockError::RenewalLost { key });
                    }
                    Err(e) => {
                        lost.send_replace(true);
                        warn!(error = %e, "lock extension failed, renewal stopped");
                        return Err(e);
                    }
                }
            }
        }
    }
}

/// Waits out a release in flight and returns the state it settled on.
///
/// A dropped sender counts as cancelled.
async fn settle_release(cancel: &mut watch::Receiver<RenewalSignal>) -> RenewalSignal {
    match cancel.wait_for(|s| *s != RenewalSignal::Releasing).await {
        Ok(state) => *state,
        Err(_) => RenewalSignal::Cancelled,
    }
}
