// crates/resilience/src/error.rs
//! Error types for resilience operations

use thiserror::Error;

/// Result type for resilience operations
pub type ResilienceResult<T> = Result<T, ResilienceError>;

/// Errors that can occur in resilience operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResilienceError {
    /// Wait timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The barrier was closed while waiting
    #[error("Operation was cancelled")]
    Cancelled,
}
