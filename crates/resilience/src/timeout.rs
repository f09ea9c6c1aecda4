// crates/resilience/src/timeout.rs
//! Timeout handling utilities

use crate::barrier::StartupBarrier;
use crate::error::ResilienceResult;
use std::time::Duration;

/// A fixed bound on how long a caller is willing to wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeout {
    duration: Duration,
}

impl Timeout {
    /// Creates a new timeout
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    /// Gets the timeout duration
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Blocks until `barrier` is raised or this timeout elapses
    pub fn wait_for(&self, barrier: &StartupBarrier) -> ResilienceResult<()> {
        barrier.wait(self.duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_duration() {
        let timeout = Timeout::from_millis(2000);
        assert_eq!(timeout.duration(), Duration::from_secs(2));
    }

    #[test]
    fn test_wait_for_barrier() {
        let barrier = StartupBarrier::new();
        let timeout = Timeout::from_millis(20);
        assert!(timeout.wait_for(&barrier).is_err());

        barrier.raise();
        assert!(timeout.wait_for(&barrier).is_ok());
    }
}
