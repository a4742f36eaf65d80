//! Integration tests sharing one cache between threads

use cachette::{Cache, MockClock, NON_PERSISTENT};
use std::sync::Arc;
use std::thread;

fn shared_cache() -> Arc<Cache> {
    Arc::new(
        Cache::builder()
            .clock(Arc::new(MockClock::new(1_000)))
            .in_memory()
            .build()
            .unwrap(),
    )
}

#[test]
fn test_concurrent_writers_and_readers() {
    let cache = shared_cache();

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..50 {
                    let id = format!("t{t}_i{i}");
                    cache.set(&id, &(t * 100 + i), 0, "").unwrap();
                    assert_eq!(cache.get::<i32>(&id, "").unwrap(), Some(t * 100 + i));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(cache.get::<i32>("t7_i49", "").unwrap(), Some(749));
}

#[test]
fn test_concurrent_non_persistent_registration() {
    let cache = shared_cache();

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..25 {
                    cache
                        .set(&format!("np_{t}_{i}"), &i, NON_PERSISTENT, "")
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(cache.non_persistent_keys().len(), 100);
    assert_eq!(cache.get::<i32>("np_3_24", "").unwrap(), Some(24));
}

#[test]
fn test_last_writer_wins() {
    let cache = shared_cache();

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || cache.set("contended", &t, 0, "").unwrap())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let value = cache.get::<i32>("contended", "").unwrap().unwrap();
    assert!((0..4).contains(&value));
}

#[test]
fn test_concurrent_trigger_firing() {
    let cache = shared_cache();
    cache.set_last_occurrence("save_post", Some(10)).unwrap();

    let handles: Vec<_> = (1..=4u64)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                cache
                    .set_last_occurrence("save_post", Some(t * 1_000))
                    .unwrap()
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let last = cache.last_occurrence("save_post").unwrap();
    assert!([1_000, 2_000, 3_000, 4_000].contains(&last));
    assert_eq!(
        cache.derive_key("events", "save_post").unwrap(),
        format!("events{last}")
    );
}
