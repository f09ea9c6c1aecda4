// crates/resilience/src/lib.rs
//! Bounded waiting primitives for coordinating independently started contexts
//!
//! - [`StartupBarrier`]: a resettable one-shot "started" signal
//! - [`Timeout`]: a fixed wait bound with deadline helpers
//!
//! # Example
//!
//! ```rust
//! use lectern_resilience::{StartupBarrier, Timeout};
//! use std::time::Duration;
//!
//! let barrier = StartupBarrier::new();
//! let timeout = Timeout::new(Duration::from_millis(10));
//!
//! assert!(timeout.wait_for(&barrier).is_err());
//! barrier.raise();
//! assert!(timeout.wait_for(&barrier).is_ok());
//! ```

mod barrier;
mod error;
mod timeout;

pub use barrier::{BarrierState, StartupBarrier};
pub use error::{ResilienceError, ResilienceResult};
pub use timeout::Timeout;
