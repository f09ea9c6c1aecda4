// crates/transport/src/lib.rs
//! System transport controls: hardware/OS play, pause, next and previous
//! buttons plus the "now playing" display.
//!
//! The [`TransportControlAdapter`] pushes display changes to a
//! [`TransportSurface`] and forwards button presses to a [`PlaybackTarget`].
//! A Play press that arrives before the engine is running waits on the
//! engine's startup barrier for a bounded time. Pause, Next and Previous do
//! not wait: without a running engine they are dropped.

mod adapter;
mod display;
mod error;
mod surface;

pub use adapter::{ButtonOutcome, PlaybackTarget, TransportControlAdapter};
pub use display::{PlaybackStatus, TransportButton, TransportDisplay};
pub use error::{TransportError, TransportResult};
pub use surface::{MemorySurface, TransportSurface};
