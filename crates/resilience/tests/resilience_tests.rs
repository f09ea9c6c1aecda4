// crates/resilience/tests/resilience_tests.rs
//! Integration tests for the startup barrier under real thread timing

use lectern_resilience::{BarrierState, ResilienceError, StartupBarrier, Timeout};
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_late_start_within_timeout_succeeds() {
    let barrier = StartupBarrier::new();
    let timeout = Timeout::from_millis(2000);

    let starter = barrier.clone();
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(500));
        starter.raise();
    });

    let start = Instant::now();
    assert!(timeout.wait_for(&barrier).is_ok());
    let waited = start.elapsed();
    assert!(waited >= Duration::from_millis(450), "waited {:?}", waited);
    assert!(waited < Duration::from_millis(2000), "waited {:?}", waited);

    handle.join().unwrap();
}

#[test]
fn test_missing_start_fails_after_timeout() {
    let barrier = StartupBarrier::new();
    let timeout = Timeout::from_millis(200);

    let start = Instant::now();
    let result = timeout.wait_for(&barrier);
    let waited = start.elapsed();

    assert_eq!(result, Err(ResilienceError::Timeout(Duration::from_millis(200))));
    assert!(waited >= Duration::from_millis(200));
    assert!(waited < Duration::from_secs(2), "must not hang: {:?}", waited);
}

#[test]
fn test_many_waiters_released_by_one_raise() {
    let barrier = StartupBarrier::new();
    let waiters: Vec<_> = (0..4)
        .map(|_| {
            let b = barrier.clone();
            thread::spawn(move || b.wait(Duration::from_secs(2)))
        })
        .collect();

    thread::sleep(Duration::from_millis(50));
    barrier.raise();

    for waiter in waiters {
        assert!(waiter.join().unwrap().is_ok());
    }
    assert_eq!(barrier.state(), BarrierState::Raised);
}

#[test]
fn test_restart_cycle() {
    let barrier = StartupBarrier::new();

    barrier.raise();
    assert!(barrier.wait(Duration::from_millis(1)).is_ok());

    // context torn down
    barrier.reset();
    assert!(barrier.wait(Duration::from_millis(20)).is_err());

    // context started again
    barrier.raise();
    assert!(barrier.wait(Duration::from_millis(1)).is_ok());
}
