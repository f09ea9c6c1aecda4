//! Media Engine - background playback for Lectern
//!
//! One engine thread owns the playback session and the [`MediaOutput`]. Direct
//! calls, command channel messages, transport buttons and output callbacks are
//! all turned into [`Trigger`]s and applied one at a time, so the current
//! track index never races.
//!
//! [`EngineHost`] is the long-lived owner: it starts and cancels engines and
//! keeps event subscriptions alive across restarts.

mod engine;
mod error;
mod events;
mod host;
mod output;
pub(crate) mod playback_thread;
mod simulated;
mod state;
mod trigger;

pub use engine::{EngineConfig, EngineContext};
pub use error::{EngineError, EngineResult, OutputError, OutputResult};
pub use events::{EngineEvent, EventBus};
pub use host::{EngineHost, OutputFactory};
pub use output::{MediaEventSink, MediaOutput};
pub use playback_thread::PlaybackEngine;
pub use simulated::{OutputCall, SimulatedOutput};
pub use state::EngineStatus;
pub use trigger::Trigger;
