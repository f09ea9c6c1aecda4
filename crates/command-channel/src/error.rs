// crates/command-channel/src/error.rs
//! Error types for command messages

use thiserror::Error;

/// Result type for command channel operations
pub type ChannelResult<T> = Result<T, ChannelError>;

#[derive(Debug, Error)]
pub enum ChannelError {
    /// Message text is not a JSON object of string/integer values
    #[error("Malformed command message: {0}")]
    Malformed(#[from] serde_json::Error),
}
