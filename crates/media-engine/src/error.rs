// FILE: crates/media-engine/src/error.rs

use thiserror::Error;

/// Errors reported by a media output backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OutputError {
    #[error("Failed to open {uri}: {reason}")]
    OpenFailed { uri: String, reason: String },

    #[error("No media is open")]
    NotOpen,

    #[error("Output backend error: {0}")]
    Backend(String),
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Playback engine is not running")]
    NotRunning,

    #[error("Playback engine queue is full")]
    QueueFull,

    #[error("Engine host has been shut down")]
    HostClosed,

    #[error("Failed to start playback thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] lectern_core::CatalogError),
}

pub type EngineResult<T> = Result<T, EngineError>;
pub type OutputResult<T> = Result<T, OutputError>;
