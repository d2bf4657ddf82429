//! Counter behaviour under sequential use, concurrency, and store faults.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tally_core::memory::MemoryKvStore;
use tally_core::store::KvStore;
use tally_core::{CounterError, CounterStore, RetryPolicy};

use fault_store::FaultStore;

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 10_000,
        base_delay: Duration::from_micros(100),
        max_delay: Duration::from_millis(2),
        deadline: Duration::from_secs(30),
    }
}

#[tokio::test]
async fn read_missing_key_is_zero() {
    let counter = CounterStore::new(Arc::new(MemoryKvStore::new()), RetryPolicy::default());
    assert_eq!(counter.read("nobody").await.unwrap(), 0);
}

#[tokio::test]
async fn first_increment_creates_with_one() {
    let kv = Arc::new(MemoryKvStore::new());
    let counter = CounterStore::new(kv.clone(), RetryPolicy::default());

    assert_eq!(counter.increment("site-visits").await.unwrap(), 1);
    let rec = kv.get_item("site-visits").await.unwrap().unwrap();
    assert_eq!(rec.count, 1);
    assert_eq!(counter.read("site-visits").await.unwrap(), 1);
}

#[tokio::test]
async fn sequential_increments_strictly_increase() {
    let counter = CounterStore::new(Arc::new(MemoryKvStore::new()), RetryPolicy::default());
    let mut last = 0;
    for _ in 0..25 {
        let n = counter.increment("k").await.unwrap();
        assert!(n > last, "{n} should exceed {last}");
        last = n;
    }
    assert_eq!(last, 25);
    assert_eq!(counter.read("k").await.unwrap(), 25);
}

#[tokio::test]
async fn keys_are_independent() {
    let counter = CounterStore::new(Arc::new(MemoryKvStore::new()), RetryPolicy::default());
    counter.increment("a").await.unwrap();
    counter.increment("a").await.unwrap();
    counter.increment("b").await.unwrap();
    assert_eq!(counter.read("a").await.unwrap(), 2);
    assert_eq!(counter.read("b").await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_increments_lose_nothing() {
    const N: u64 = 64;
    let counter = CounterStore::new(Arc::new(MemoryKvStore::new()), fast_policy());

    let mut tasks = Vec::new();
    for _ in 0..N {
        let c = counter.clone();
        tasks.push(tokio::spawn(async move { c.increment("hot").await }));
    }

    let mut seen = Vec::new();
    for t in tasks {
        seen.push(t.await.unwrap().unwrap());
    }
    seen.sort_unstable();

    assert_eq!(seen, (1..=N).collect::<Vec<_>>());
    assert_eq!(counter.read("hot").await.unwrap(), N);
}

#[tokio::test]
async fn rival_create_falls_back_to_increment() {
    let kv = Arc::new(FaultStore::new());
    kv.rival_creates_first.store(true, Ordering::SeqCst);
    let counter = CounterStore::new(kv.clone(), RetryPolicy::default());

    assert_eq!(counter.increment("k").await.unwrap(), 2);
    assert_eq!(counter.read("k").await.unwrap(), 2);
    assert_eq!(counter.conflicts(), 0);
}

#[tokio::test]
async fn deleted_record_is_recreated() {
    let kv = Arc::new(MemoryKvStore::new());
    let counter = CounterStore::new(kv.clone(), RetryPolicy::default());
    counter.increment("k").await.unwrap();
    counter.increment("k").await.unwrap();

    kv.remove("k");
    assert_eq!(counter.increment("k").await.unwrap(), 1);
}

#[tokio::test]
async fn record_vanishing_after_lost_create_is_retried() {
    let kv = Arc::new(FaultStore::new());
    kv.rival_create_vanishes.store(true, Ordering::SeqCst);
    let counter = CounterStore::new(kv.clone(), RetryPolicy::default());

    assert_eq!(counter.increment("k").await.unwrap(), 1);
    assert_eq!(counter.conflicts(), 1);
    assert_eq!(counter.read("k").await.unwrap(), 1);
}

#[tokio::test]
async fn backoff_past_deadline_gives_up_early() {
    let kv = Arc::new(FaultStore::new());
    let counter = CounterStore::new(
        kv.clone(),
        RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(500),
            deadline: Duration::from_millis(100),
        },
    );
    counter.increment("k").await.unwrap();

    kv.always_conflict.store(true, Ordering::SeqCst);
    let started = std::time::Instant::now();
    let err = counter.increment("k").await.unwrap_err();
    assert!(matches!(err, CounterError::Timeout), "{err:?}");
    assert_eq!(counter.conflicts(), 1);
    assert!(started.elapsed() < Duration::from_millis(500));
}

#[tokio::test]
async fn persistent_conflicts_end_in_contention() {
    let kv = Arc::new(FaultStore::new());
    let counter = CounterStore::new(
        kv.clone(),
        RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            deadline: Duration::from_secs(5),
        },
    );
    counter.increment("k").await.unwrap();

    kv.always_conflict.store(true, Ordering::SeqCst);
    let err = counter.increment("k").await.unwrap_err();
    assert!(matches!(err, CounterError::Contention { attempts: 4 }), "{err:?}");
    assert_eq!(counter.conflicts(), 4);
    assert_eq!(err.client_code().as_str(), "CONTENTION");

    kv.always_conflict.store(false, Ordering::SeqCst);
    assert_eq!(counter.read("k").await.unwrap(), 1);
}

#[tokio::test]
async fn store_failure_leaves_state_untouched() {
    let kv = Arc::new(FaultStore::new());
    let counter = CounterStore::new(kv.clone(), RetryPolicy::default());
    for _ in 0..3 {
        counter.increment("k").await.unwrap();
    }

    kv.fail_puts.store(true, Ordering::SeqCst);
    let err = counter.increment("k").await.unwrap_err();
    assert!(matches!(err, CounterError::Store(_)), "{err:?}");
    assert_eq!(err.client_code().as_str(), "STORE_UNAVAILABLE");

    kv.fail_puts.store(false, Ordering::SeqCst);
    assert_eq!(counter.read("k").await.unwrap(), 3);
    assert_eq!(counter.increment("k").await.unwrap(), 4);
}

#[tokio::test]
async fn read_surfaces_transport_errors() {
    let kv = Arc::new(FaultStore::new());
    kv.fail_gets.store(true, Ordering::SeqCst);
    let counter = CounterStore::new(kv.clone(), RetryPolicy::default());

    assert!(matches!(counter.read("k").await, Err(CounterError::Store(_))));
    assert!(matches!(counter.increment("k").await, Err(CounterError::Store(_))));
    assert_eq!(kv.puts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn slow_store_hits_deadline() {
    let kv = Arc::new(FaultStore::new());
    kv.get_delay_ms.store(500, Ordering::SeqCst);
    let counter = CounterStore::new(
        kv,
        RetryPolicy {
            deadline: Duration::from_millis(50),
            ..RetryPolicy::default()
        },
    );

    assert!(matches!(counter.increment("k").await, Err(CounterError::Timeout)));
    assert!(matches!(counter.read("k").await, Err(CounterError::Timeout)));
}

#[tokio::test]
async fn invalid_keys_are_rejected() {
    let kv = Arc::new(FaultStore::new());
    let counter = CounterStore::new(kv.clone(), RetryPolicy::default());

    let err = counter.increment("").await.unwrap_err();
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");

    let long = "x".repeat(tally_core::counter::MAX_KEY_BYTES + 1);
    assert!(matches!(counter.read(&long).await, Err(CounterError::BadRequest(_))));
    assert_eq!(kv.puts.load(Ordering::SeqCst), 0);
}
