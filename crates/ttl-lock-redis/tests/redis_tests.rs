//! Integration tests for Redis-backed TTL locks.

use std::time::Duration;

use ttl_lock_core::prelude::*;
use ttl_lock_redis::RedisLockProvider;

const TTL: Duration = Duration::from_secs(10);

/// Helper to get Redis URL from environment or use default.
fn get_redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
}

async fn provider() -> RedisLockProvider {
    RedisLockProvider::builder()
        .url(get_redis_url())
        .ttl(TTL)
        .renewal_interval(Duration::from_secs(3))
        .key_prefix(format!("ttl-lock-test:{}:", create_lock_id()))
        .build()
        .await
        .unwrap()
}

#[tokio::test]
#[ignore] // Requires Redis server running
async fn test_lock_and_unlock() {
    let provider = provider().await;
    let mut lock = provider.create_lock("lock");

    lock.acquire().await.unwrap();
    lock.release().await.unwrap();

    assert_eq!(lock.remaining_ttl().await.unwrap(), KeyTtl::Missing);
}

#[tokio::test]
#[ignore] // Requires Redis server running
async fn test_lock_again() {
    let provider = provider().await;
    let mut lock = provider.create_lock("lock-again");

    lock.acquire().await.unwrap();
    assert!(lock.acquire().await.unwrap_err().is_not_acquired());

    lock.release().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires Redis server running
async fn test_two_locks_with_different_tokens() {
    let provider = provider().await;
    let mut lock1 = provider.create_lock("two-tokens");
    let mut lock2 = provider.create_lock("two-tokens");

    lock1.acquire().await.unwrap();
    assert!(lock2.acquire().await.unwrap_err().is_not_acquired());

    // The second handle cannot release the first one's lock
    assert!(lock2.release().await.unwrap_err().is_wrong_key_or_owner());
    assert!(lock1.remaining_ttl().await.unwrap().exists());

    lock1.release().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires Redis server running
async fn test_unlock_empty_lock() {
    let provider = provider().await;
    let mut lock = provider.create_lock("unlock-empty");

    assert!(lock.release().await.unwrap_err().is_wrong_key_or_owner());
}

#[tokio::test]
#[ignore] // Requires Redis server running
async fn test_unlock_twice_and_lock_again() {
    let provider = provider().await;
    let mut lock = provider.create_lock("hello");

    lock.acquire().await.unwrap();
    lock.release().await.unwrap();
    assert!(lock.release().await.unwrap_err().is_wrong_key_or_owner());

    lock.acquire().await.unwrap();
    lock.release().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires Redis server running
async fn test_ttl_and_expire() {
    let provider = provider().await;
    let mut lock = provider.create_lock("foo");
    lock.acquire().await.unwrap();

    let ttl = lock.remaining_ttl().await.unwrap().remaining().unwrap();
    assert!(ttl <= TTL);

    assert!(lock.expire(TTL * 2).await.unwrap());

    let ttl = lock.remaining_ttl().await.unwrap().remaining().unwrap();
    assert!(ttl >= TTL);
    assert!(ttl <= TTL * 2);

    lock.release().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires Redis server running
async fn test_job_scenario() {
    let provider = provider().await;
    let mut first = provider.create_lock_with_token("job-42", "abc");
    let mut second = provider.create_lock_with_token("job-42", "xyz");

    first.acquire().await.unwrap();
    assert!(second.acquire().await.unwrap_err().is_not_acquired());

    first.release().await.unwrap();
    second.acquire().await.unwrap();
    second.release().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires Redis server running
async fn test_lock_expiry() {
    let provider = RedisLockProvider::builder()
        .url(get_redis_url())
        .ttl(Duration::from_millis(200))
        .renewal_interval(Duration::from_millis(50))
        .key_prefix(format!("ttl-lock-test:{}:", create_lock_id()))
        .build()
        .await
        .unwrap();
    let mut lock1 = provider.create_lock("expiry");
    let mut lock2 = provider.create_lock("expiry");

    lock1.acquire().await.unwrap();

    // Wait for lock to expire (longer than expiry time)
    tokio::time::sleep(Duration::from_millis(300)).await;

    lock2.acquire().await.unwrap();
    assert!(lock1.release().await.unwrap_err().is_wrong_key_or_owner());
    lock2.release().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires Redis server running
async fn test_renewal_outlives_ttl() {
    let provider = RedisLockProvider::builder()
        .url(get_redis_url())
        .ttl(Duration::from_millis(300))
        .renewal_interval(Duration::from_millis(100))
        .key_prefix(format!("ttl-lock-test:{}:", create_lock_id()))
        .build()
        .await
        .unwrap();
    let mut lock = provider.create_lock("renewed");

    lock.acquire().await.unwrap();
    let renewal = lock.start_renewal(provider.renewal_interval()).unwrap();

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert!(lock.remaining_ttl().await.unwrap().exists());

    lock.release().await.unwrap();
    renewal.wait().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore] // Requires Redis server running
async fn test_concurrent_acquire() {
    let provider = provider().await;

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let mut lock = provider.create_lock("race");
            tokio::spawn(async move { lock.acquire().await.map(|()| lock) })
        })
        .collect();

    let mut winners = Vec::new();
    for task in tasks {
        match task.await.unwrap() {
            Ok(lock) => winners.push(lock),
            Err(e) => assert!(e.is_not_acquired(), "unexpected error: {e}"),
        }
    }

    assert_eq!(winners.len(), 1);
    winners[0].release().await.unwrap();
}
