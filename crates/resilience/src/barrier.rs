// crates/resilience/src/barrier.rs
//! Resettable one-shot "started" signal

use crate::error::{ResilienceError, ResilienceResult};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Observable state of a [`StartupBarrier`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierState {
    /// Not raised yet; waiters block
    Pending,
    /// Raised; waiters pass immediately
    Raised,
    /// Closed for good; waiters fail with [`ResilienceError::Cancelled`]
    Closed,
}

#[derive(Debug)]
struct Inner {
    state: Mutex<BarrierState>,
    changed: Condvar,
}

/// One-shot signal that a background context has finished starting
///
/// Clones share the same signal. Raising is idempotent. [`StartupBarrier::reset`]
/// re-arms the barrier after the signalling context goes away, so the next
/// waiter blocks again until a fresh start raises it.
#[derive(Debug, Clone)]
pub struct StartupBarrier {
    inner: Arc<Inner>,
}

impl StartupBarrier {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(BarrierState::Pending),
                changed: Condvar::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BarrierState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, next: BarrierState) {
        let mut state = self.lock();
        if *state == BarrierState::Closed {
            log::debug!("Ignoring {:?} on a closed startup barrier", next);
            return;
        }
        if *state != next {
            log::debug!("Startup barrier {:?} -> {:?}", *state, next);
            *state = next;
        }
        self.inner.changed.notify_all();
    }

    /// Signals that the background context is up
    pub fn raise(&self) {
        self.transition(BarrierState::Raised);
    }

    /// Re-arms the barrier
    pub fn reset(&self) {
        self.transition(BarrierState::Pending);
    }

    /// Permanently releases every waiter with a cancellation error
    pub fn close(&self) {
        let mut state = self.lock();
        *state = BarrierState::Closed;
        self.inner.changed.notify_all();
    }

    pub fn state(&self) -> BarrierState {
        *self.lock()
    }

    pub fn is_raised(&self) -> bool {
        self.state() == BarrierState::Raised
    }

    /// Blocks until the barrier is raised, closed, or `timeout` elapses
    pub fn wait(&self, timeout: Duration) -> ResilienceResult<()> {
        let guard = self.lock();
        let (state, _) = self
            .inner
            .changed
            .wait_timeout_while(guard, timeout, |s| *s == BarrierState::Pending)
            .unwrap_or_else(PoisonError::into_inner);

        match *state {
            BarrierState::Raised => Ok(()),
            BarrierState::Closed => Err(ResilienceError::Cancelled),
            BarrierState::Pending => {
                log::warn!("Startup barrier not raised within {:?}", timeout);
                Err(ResilienceError::Timeout(timeout))
            }
        }
    }
}

impl Default for StartupBarrier {
    fn default() -> Self {
        Self::new()
    }
}
