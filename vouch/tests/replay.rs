//! Concurrency and property tests for the replay stores.

use std::sync::{Arc, Barrier};
use std::thread;

use proptest::prelude::*;
use vouch::UnixTimestamp;
use vouch::replay::{ConsumedMandateCache, InMemoryReplayStore, ReplayConfig, ReplayStore};

const CALLERS: usize = 100;

fn race<F>(f: F) -> Vec<bool>
where
    F: Fn() -> bool + Send + Sync + 'static,
{
    let f = Arc::new(f);
    let barrier = Arc::new(Barrier::new(CALLERS));
    let handles: Vec<_> = (0..CALLERS)
        .map(|_| {
            let f = Arc::clone(&f);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                f()
            })
        })
        .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

#[test]
fn test_replay_store_single_winner() {
    let store = Arc::new(InMemoryReplayStore::default());
    let now = UnixTimestamp::from_secs(1_000);
    let expires = now + 300;

    let shared = Arc::clone(&store);
    let results = race(move || shared.check_and_store("pm-contended", expires, now).unwrap());

    assert_eq!(results.iter().filter(|won| **won).count(), 1);
    assert_eq!(results.iter().filter(|won| !**won).count(), CALLERS - 1);
    assert_eq!(store.stats(now).active, 1);
}

#[test]
fn test_consumed_cache_single_winner() {
    let cache: Arc<ConsumedMandateCache<String>> = Arc::new(ConsumedMandateCache::default());
    let now = UnixTimestamp::from_secs(1_000);

    let shared = Arc::clone(&cache);
    let results = race(move || shared.consume_mandate("content-hash", "payload".to_owned(), None, now));

    assert_eq!(results.iter().filter(|won| **won).count(), 1);
    assert_eq!(cache.stats().total_consumed, 1);
    assert_eq!(cache.stats().entries, 1);
}

#[test]
fn test_cleanup_concurrent_with_inserts_keeps_live_records() {
    let store = Arc::new(InMemoryReplayStore::new(ReplayConfig { max_entries: 1_000_000 }));
    let now = UnixTimestamp::from_secs(5_000);

    for i in 0..500 {
        store
            .check_and_store(&format!("stale-{i}"), UnixTimestamp::from_secs(10), UnixTimestamp::from_secs(1))
            .unwrap();
    }

    let writers: Vec<_> = (0..4)
        .map(|w| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..250 {
                    assert!(store.check_and_store(&format!("live-{w}-{i}"), now + 60, now).unwrap());
                }
            })
        })
        .collect();
    let sweeper = {
        let store = Arc::clone(&store);
        thread::spawn(move || (0..20).map(|_| store.cleanup(now)).sum::<usize>())
    };

    for writer in writers {
        writer.join().unwrap();
    }
    let removed = sweeper.join().unwrap() + store.cleanup(now);

    assert_eq!(removed, 500);
    let stats = store.stats(now);
    assert_eq!(stats.active, 1_000);
    assert_eq!(stats.expired, 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_second_call_within_window_is_replay(
        key in "[a-z0-9-]{1,32}",
        start in 0u64..1_000_000,
        ttl in 1u64..10_000,
        offset in 0u64..10_000,
    ) {
        let store = InMemoryReplayStore::default();
        let now = UnixTimestamp::from_secs(start);
        let expires = now + ttl;
        let later = now + offset.min(ttl - 1);

        prop_assert!(store.check_and_store(&key, expires, now).unwrap());
        prop_assert!(!store.check_and_store(&key, expires, later).unwrap());
        prop_assert!(store.check_and_store(&key, expires + ttl, expires).unwrap());
    }

    #[test]
    fn prop_cleanup_never_removes_live(
        expiries in proptest::collection::vec(0u64..200, 1..64),
        now in 0u64..200,
    ) {
        let store = InMemoryReplayStore::default();
        for (i, exp) in expiries.iter().enumerate() {
            store
                .check_and_store(&i.to_string(), UnixTimestamp::from_secs(*exp), UnixTimestamp::from_secs(0))
                .unwrap();
        }
        let now = UnixTimestamp::from_secs(now);
        let live_before = store.stats(now).active;
        let removed = store.cleanup(now);

        prop_assert_eq!(store.stats(now).active, live_before);
        prop_assert_eq!(removed + live_before, expiries.len());
    }
}
