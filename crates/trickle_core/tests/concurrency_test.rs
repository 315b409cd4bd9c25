//! # Concurrency Tests
//!
//! Many consumers against one producer. Verifies visibility, wakeups and
//! completion under real thread interleavings.

use crossbeam_channel::unbounded;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use trickle_core::{LazyVec, LazyVecConfig, SequenceError};

/// Test: every consumer sees every element, in order, exactly once.
#[test]
fn test_many_consumers_see_full_sequence() {
    let total = 5_000usize;
    let num_consumers = 8;

    let config = LazyVecConfig::production().with_label("fanout");
    let seq: Arc<LazyVec<usize>> = Arc::new(LazyVec::with_config(config));
    let (tx, rx) = unbounded();

    let consumers: Vec<_> = (0..num_consumers)
        .map(|id| {
            let seq = Arc::clone(&seq);
            let tx = tx.clone();
            thread::spawn(move || {
                let items: Vec<usize> = seq.iter().collect::<Result<_, _>>().unwrap();
                tx.send((id, items)).unwrap();
            })
        })
        .collect();
    drop(tx);

    for i in 0..total {
        seq.append(i);
    }
    seq.done();

    for c in consumers {
        c.join().unwrap();
    }

    let expected: Vec<usize> = (0..total).collect();
    let mut reports = 0;
    for (id, items) in rx {
        assert_eq!(items, expected, "consumer {id} saw a different sequence");
        reports += 1;
    }
    assert_eq!(reports, num_consumers);
}

/// Test: a read that passes the gate always finds the appended value.
#[test]
fn test_read_after_write_visibility() {
    let total = 10_000usize;
    let seq: Arc<LazyVec<usize>> = Arc::new(LazyVec::new());

    let reader = {
        let seq = Arc::clone(&seq);
        thread::spawn(move || {
            for i in (0..total).rev().step_by(97) {
                assert_eq!(seq.get(i).unwrap(), i * 2, "wrong value at {i}");
            }
            for i in 0..total {
                assert_eq!(seq.get(i).unwrap(), i * 2, "wrong value at {i}");
            }
        })
    };

    for i in 0..total {
        seq.append(i * 2);
    }
    reader.join().unwrap();
    seq.done();
}

/// Test: done() releases consumers blocked on arbitrary thresholds.
#[test]
fn test_done_releases_all_blocked_readers() {
    let seq: Arc<LazyVec<u32>> = Arc::new(LazyVec::new());
    let released = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = unbounded();

    let thresholds = [0usize, 1, 2, 10, 1_000, usize::MAX - 1];
    let readers: Vec<_> = thresholds
        .iter()
        .map(|&index| {
            let seq = Arc::clone(&seq);
            let released = Arc::clone(&released);
            let tx = tx.clone();
            thread::spawn(move || {
                let result = seq.get(index);
                released.fetch_add(1, Ordering::SeqCst);
                tx.send((index, result)).unwrap();
            })
        })
        .collect();
    drop(tx);

    // The first append releases exactly one reader (index 0).
    seq.append(7);
    let (index, result) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!((index, result), (0, Ok(7)));

    thread::sleep(Duration::from_millis(30));
    assert_eq!(released.load(Ordering::SeqCst), 1);

    let start = Instant::now();
    seq.done();
    for r in readers {
        r.join().unwrap();
    }
    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(released.load(Ordering::SeqCst), thresholds.len());

    for (index, result) in rx {
        assert_eq!(result, Err(SequenceError::OutOfRange { index, len: 1 }));
    }
}

/// Test: jittered producer, jittered consumers, bounded waits. Nothing hangs,
/// nothing is lost.
#[test]
fn test_jittered_stress() {
    let total = 400u32;
    let seq: Arc<LazyVec<u32>> = Arc::new(LazyVec::new());

    let producer = {
        let seq = Arc::clone(&seq);
        thread::spawn(move || {
            let mut rng = StdRng::seed_from_u64(42);
            let producer = seq.producer();
            let mut next = 0u32;
            while next < total {
                let batch = rng.gen_range(1..=8).min(total - next);
                producer.extend(next..next + batch).unwrap();
                next += batch;
                if rng.gen_bool(0.3) {
                    thread::sleep(Duration::from_micros(rng.gen_range(50..500)));
                }
            }
        })
    };

    let consumers: Vec<_> = (0..4u64)
        .map(|seed| {
            let seq = Arc::clone(&seq);
            thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(seed);
                let mut sum = 0u64;
                for i in 0..total as usize {
                    let value = seq.get_timeout(i, Duration::from_secs(10)).unwrap();
                    sum += u64::from(value);
                    if rng.gen_bool(0.05) {
                        thread::yield_now();
                    }
                }
                sum
            })
        })
        .collect();

    producer.join().unwrap();
    let expected: u64 = (0..u64::from(total)).sum();
    for c in consumers {
        assert_eq!(c.join().unwrap(), expected);
    }
    assert_eq!(seq.size(), total as usize);
}
