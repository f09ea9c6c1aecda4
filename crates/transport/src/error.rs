// crates/transport/src/error.rs
//! Error types for transport control dispatch

use std::time::Duration;
use thiserror::Error;

pub type TransportResult<T> = Result<T, TransportError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The engine did not signal startup within the barrier timeout
    #[error("Background engine did not initialise within {0:?}")]
    StartupTimeout(Duration),

    /// The startup barrier was closed while waiting
    #[error("Engine startup was cancelled")]
    StartupCancelled,

    /// Startup completed but the engine refused the command
    #[error("Engine rejected the {0} command")]
    Rejected(String),
}
