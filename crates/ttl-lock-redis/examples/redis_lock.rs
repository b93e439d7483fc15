//! Example: Using Redis TTL locks
//!
//! Run with: `cargo run -p ttl-lock-redis --example redis_lock`
//!
//! Requires a Redis server. Set REDIS_URL environment variable
//! or modify the URL below. Set RUST_LOG=debug to see renewal ticks.

use std::time::Duration;

use tracing_subscriber::EnvFilter;
use ttl_lock_core::prelude::*;
use ttl_lock_redis::RedisLockProvider;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Get Redis URL from environment or use default
    let redis_url =
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

    println!("Connecting to Redis...");
    let provider = RedisLockProvider::builder()
        .url(&redis_url)
        .ttl(Duration::from_secs(6))
        .renewal_interval(Duration::from_secs(2))
        .key_prefix("example:")
        .build()
        .await?;

    // Create a lock by name
    let mut lock = provider.create_lock("job-42");
    println!("Created lock: {} (token {})", lock.key(), lock.token());

    // A second handle on the same key cannot take it
    let mut contender = provider.create_lock("job-42");

    lock.acquire().await?;
    println!("Lock acquired, ttl: {:?}", lock.remaining_ttl().await?);

    match contender.acquire().await {
        Err(e) if e.is_not_acquired() => println!("Contender refused: {e}"),
        other => println!("Unexpected contender outcome: {other:?}"),
    }

    // Keep the lock alive past its TTL while working
    let renewal = lock.start_renewal(provider.renewal_interval())?;
    let mut lost = renewal.lost_token().clone();

    println!("Doing long-running work...");
    tokio::select! {
        _ = lost.wait_for(|lost| *lost) => {
            eprintln!("Lock was lost, abandoning work");
            renewal.wait().await?;
            return Ok(());
        }
        _ = tokio::time::sleep(Duration::from_secs(10)) => {
            println!("Work completed, ttl: {:?}", lock.remaining_ttl().await?);
        }
    }

    // Release the lock; this also stops the renewal loop
    lock.release().await?;
    renewal.wait().await?;
    println!("Lock released");

    // Releasing again is refused rather than deleting someone else's key
    if let Err(e) = lock.release().await {
        println!("Second release refused: {e}");
    }

    contender.acquire().await?;
    println!("Contender acquired after release");
    contender.release().await?;

    Ok(())
}
