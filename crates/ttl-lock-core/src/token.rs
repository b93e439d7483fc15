//! Ownership token generation.

use std::process;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;

/// Generates a unique ownership token.
///
/// Format: `{process_id}_{counter}_{random}`. The counter keeps tokens from
/// one process distinct even if the random component repeats.
pub fn create_lock_id() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let counter = COUNTER.fetch_add(1, Ordering::Relaxed);

    let pid = process::id();

    let mut rng = rand::thread_rng();
    let random: u64 = rng.r#gen();

    format!("{}_{}_{:016x}", pid, counter, random)
}
