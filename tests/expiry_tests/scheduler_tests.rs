//! Tests for ExpiryScheduler
//!
//! These tests verify:
//! - Timers fire once after their TTL
//! - Cancelled and superseded timers never act
//! - Generation bookkeeping
//! - All timers share one worker thread

use std::time::Duration;

use crossbeam::channel;
use slotkv::expiry::{ExpiryScheduler, WORKER_THREAD_NAME};

const SHORT: Duration = Duration::from_millis(50);
const WAIT: Duration = Duration::from_millis(500);

#[test]
fn test_timer_fires_after_ttl() {
    let scheduler = ExpiryScheduler::new();
    let (tx, rx) = channel::unbounded();

    let generation = scheduler
        .schedule("k", SHORT, move |key, generation| {
            tx.send((key.to_string(), generation)).unwrap();
        })
        .unwrap();

    assert!(scheduler.is_current("k", generation));
    assert_eq!(scheduler.pending(), 1);

    let (key, fired) = rx.recv_timeout(WAIT).unwrap();
    assert_eq!(key, "k");
    assert_eq!(fired, generation);
}

#[test]
fn test_timer_does_not_fire_early() {
    let scheduler = ExpiryScheduler::new();
    let (tx, rx) = channel::unbounded::<()>();

    scheduler
        .schedule("k", Duration::from_secs(5), move |_, _| {
            let _ = tx.send(());
        })
        .unwrap();

    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
}

#[test]
fn test_cancelled_timer_never_fires() {
    let scheduler = ExpiryScheduler::new();
    let (tx, rx) = channel::unbounded::<()>();

    scheduler
        .schedule("k", SHORT, move |_, _| {
            let _ = tx.send(());
        })
        .unwrap();

    assert!(scheduler.cancel("k"));
    assert_eq!(scheduler.pending(), 0);

    // The worker drops the cancelled callback, disconnecting the channel
    assert!(matches!(
        rx.recv_timeout(WAIT),
        Err(channel::RecvTimeoutError::Disconnected)
    ));
}

#[test]
fn test_cancel_unknown_key() {
    let scheduler = ExpiryScheduler::new();

    assert!(!scheduler.cancel("nothing"));
}

#[test]
fn test_reschedule_supersedes_previous_timer() {
    let scheduler = ExpiryScheduler::new();
    let (tx, rx) = channel::unbounded();

    let tx_first = tx.clone();
    let first = scheduler
        .schedule("k", SHORT, move |_, generation| {
            tx_first.send(generation).unwrap();
        })
        .unwrap();
    let second = scheduler
        .schedule("k", Duration::from_millis(100), move |_, generation| {
            tx.send(generation).unwrap();
        })
        .unwrap();

    assert!(second > first);
    assert!(!scheduler.is_current("k", first));
    assert!(scheduler.is_current("k", second));

    assert_eq!(rx.recv_timeout(WAIT).unwrap(), second);
}

#[test]
fn test_take_if_current_only_once() {
    let scheduler = ExpiryScheduler::new();
    let generation = scheduler
        .schedule("k", Duration::from_secs(60), |_, _| {})
        .unwrap();

    assert!(!scheduler.take_if_current("k", generation + 1));
    assert!(scheduler.take_if_current("k", generation));
    assert!(!scheduler.take_if_current("k", generation));
    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn test_cancel_all() {
    let scheduler = ExpiryScheduler::new();
    for i in 0..5 {
        scheduler
            .schedule(&format!("k{}", i), Duration::from_secs(60), |_, _| {})
            .unwrap();
    }
    assert_eq!(scheduler.pending(), 5);

    scheduler.cancel_all();

    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn test_timers_fire_in_deadline_order() {
    let scheduler = ExpiryScheduler::new();
    let (tx, rx) = channel::unbounded();

    for (key, ms) in [("late", 150), ("early", 30), ("middle", 90)] {
        let tx = tx.clone();
        scheduler
            .schedule(key, Duration::from_millis(ms), move |key, _| {
                tx.send(key.to_string()).unwrap();
            })
            .unwrap();
    }

    let fired: Vec<String> = (0..3).map(|_| rx.recv_timeout(WAIT).unwrap()).collect();
    assert_eq!(fired, vec!["early", "middle", "late"]);
    assert_eq!(scheduler.pending(), 3);
}

#[test]
fn test_expired_callback_can_take_its_timer() {
    let scheduler = std::sync::Arc::new(ExpiryScheduler::new());
    let (tx, rx) = channel::unbounded();

    let weak = std::sync::Arc::downgrade(&scheduler);
    scheduler
        .schedule("k", SHORT, move |key, generation| {
            let scheduler = weak.upgrade().unwrap();
            tx.send(scheduler.take_if_current(key, generation)).unwrap();
        })
        .unwrap();

    assert!(rx.recv_timeout(WAIT).unwrap());
    assert_eq!(scheduler.pending(), 0);
}

// =============================================================================
// Worker Thread
// =============================================================================

/// Threads of this process running an expiry worker
#[cfg(target_os = "linux")]
fn worker_threads() -> usize {
    std::fs::read_dir("/proc/self/task")
        .unwrap()
        .filter_map(|task| std::fs::read_to_string(task.ok()?.path().join("comm")).ok())
        .filter(|comm| comm.trim_end() == WORKER_THREAD_NAME)
        .count()
}

#[cfg(target_os = "linux")]
#[test]
fn test_many_timers_share_one_worker() {
    let before = worker_threads();
    let scheduler = ExpiryScheduler::new();

    for i in 0..500 {
        scheduler
            .schedule(&format!("k{}", i), Duration::from_secs(3600), |_, _| {})
            .unwrap();
    }

    assert_eq!(scheduler.pending(), 500);
    // Other tests in this binary may be running their own worker
    assert!(worker_threads() <= before + 16);
}
