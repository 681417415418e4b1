//! Concurrency Tests
//!
//! Tests verify:
//! - Concurrent readers and writers on one keyspace keep it consistent
//! - Lazy eviction racing with rebinding never loses a fresh value
//! - Refcounts settle once every thread is done
//! - The background sweeper evicts without any reads

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use nimbuskv::{Config, Keyspace, ManualClock, NimbusError, Object, Server, Sweeper};

// =============================================================================
// Keyspace Contention Tests
// =============================================================================

#[test]
fn test_concurrent_writes_distinct_keys() {
    let ks = Arc::new(Keyspace::new(0));

    let mut handles = vec![];
    for i in 0..10 {
        let ks = Arc::clone(&ks);
        handles.push(thread::spawn(move || {
            for j in 0..100 {
                ks.set(format!("key{}_{}", i, j), Object::string(format!("value{}_{}", i, j)));
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(ks.size(), 1000);
    assert_eq!(ks.get("key3_42").unwrap(), Object::string("value3_42"));
}

#[test]
fn test_concurrent_set_get_delete_same_key() {
    let ks = Arc::new(Keyspace::new(0));
    let shared = Object::string("shared");

    let mut handles = vec![];
    for i in 0..8 {
        let ks = Arc::clone(&ks);
        let obj = shared.retain();
        handles.push(thread::spawn(move || {
            for j in 0..500 {
                match (i + j) % 3 {
                    0 => ks.set("hot", obj.retain()),
                    1 => {
                        if let Ok(found) = ks.get("hot") {
                            assert_eq!(found, Object::string("shared"));
                        }
                    }
                    _ => {
                        ks.delete("hot");
                    }
                }
            }
            drop(obj);
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    // Either bound once or not at all
    let bound = usize::from(ks.exists("hot"));
    assert_eq!(ks.size(), bound);
    assert_eq!(shared.refcount(), 1 + bound);
}

#[test]
fn test_concurrent_readers_during_expiry() {
    let clock = Arc::new(ManualClock::new(1_000));
    let ks = Arc::new(Keyspace::with_clock(0, clock.clone(), 0));

    for i in 0..100 {
        ks.set_with_expiry(format!("k{i}"), Object::string("v"), 1);
    }
    clock.advance(1);

    let mut handles = vec![];
    for _ in 0..8 {
        let ks = Arc::clone(&ks);
        handles.push(thread::spawn(move || {
            for i in 0..100 {
                let key = format!("k{i}");
                assert!(!ks.exists(&key));
                assert_eq!(ks.ttl(&key), -2);
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(ks.size(), 0);
    assert_eq!(ks.sweep_expired(), 0);
}

#[test]
fn test_rebinding_while_readers_evict() {
    let clock = Arc::new(ManualClock::new(1_000));
    let ks = Arc::new(Keyspace::with_clock(0, clock.clone(), 0));

    ks.set_with_expiry("k", Object::string("stale"), 1);
    clock.advance(1);

    let writer = {
        let ks = Arc::clone(&ks);
        thread::spawn(move || ks.set("k", Object::string("fresh")))
    };
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let ks = Arc::clone(&ks);
            thread::spawn(move || {
                for _ in 0..200 {
                    if let Ok(found) = ks.get("k") {
                        assert_eq!(found, Object::string("fresh"));
                    }
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    // The fresh binding has no TTL and must survive every eviction attempt
    assert_eq!(ks.get("k").unwrap(), Object::string("fresh"));
    assert_eq!(ks.ttl("k"), -1);
}

// =============================================================================
// Server Tests
// =============================================================================

#[test]
fn test_parallel_work_on_separate_databases() {
    let server = Arc::new(Server::new(4));

    let handles: Vec<_> = (0..4)
        .map(|db| {
            let server = Arc::clone(&server);
            thread::spawn(move || {
                let ks = server.database_at(db).unwrap();
                for i in 0..250 {
                    ks.set(format!("k{i}"), Object::string(db.to_string()));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    for db in server.databases() {
        assert_eq!(db.size(), 250);
        assert_eq!(db.get("k0").unwrap(), Object::string(db.id().to_string()));
    }
}

// =============================================================================
// Sweeper Tests
// =============================================================================

#[test]
fn test_sweeper_evicts_unread_keys() {
    let clock = Arc::new(ManualClock::new(1_000));
    let config = Config::builder().databases(2).build();
    let server = Arc::new(Server::with_clock(&config, clock.clone()));

    for db in server.databases() {
        for i in 0..5 {
            db.set_with_expiry(format!("temp:{i}"), Object::string("v"), 1);
        }
        db.set("keep", Object::string("v"));
    }

    let sweeper = Sweeper::spawn(Arc::clone(&server), Duration::from_millis(5)).unwrap();
    clock.advance(1);

    let deadline = Instant::now() + Duration::from_secs(5);
    while sweeper.evicted() < 10 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }

    assert_eq!(sweeper.stop(), 10);
    assert_eq!(server.total_keys(), 2);
}

#[test]
fn test_sweeper_stops_on_drop() {
    let server = Arc::new(Server::new(1));
    let sweeper = Sweeper::spawn(Arc::clone(&server), Duration::from_millis(1)).unwrap();
    drop(sweeper);

    // Only the test's own handle remains once the thread has exited
    assert_eq!(Arc::strong_count(&server), 1);
}

#[test]
fn test_sweeper_rejects_zero_interval() {
    let server = Arc::new(Server::new(1));

    let result = Sweeper::spawn(Arc::clone(&server), Duration::ZERO);
    assert!(matches!(result, Err(NimbusError::Config(_))));

    // No thread was started, so nothing else holds the server
    assert_eq!(Arc::strong_count(&server), 1);
}
