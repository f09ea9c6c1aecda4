// FILE: crates/media-engine/src/output.rs

//! The media output seam: whatever actually decodes and renders audio

use crate::error::OutputResult;
use crate::trigger::Trigger;
use crossbeam_channel::{Sender, TrySendError};
use lectern_core::MediaState;

/// A decode/render backend owned exclusively by the playback engine
///
/// `open` replaces whatever was open before. Completion and state changes are
/// reported through the [`MediaEventSink`] handed to `open`; events sent
/// through an older sink are ignored by the engine.
pub trait MediaOutput: Send {
    fn open(&mut self, uri: &str, events: MediaEventSink) -> OutputResult<()>;
    fn play(&mut self) -> OutputResult<()>;
    fn pause(&mut self) -> OutputResult<()>;
    /// Releases the open media, if any
    fn close(&mut self);
    fn state(&self) -> MediaState;
}

/// Event callbacks for one opened media handle
///
/// Events are queued onto the engine's trigger queue tagged with the handle's
/// generation. Sending never blocks, so outputs may call it from the engine
/// thread itself.
#[derive(Debug, Clone)]
pub struct MediaEventSink {
    generation: u64,
    tx: Sender<Trigger>,
}

impl MediaEventSink {
    pub(crate) fn new(generation: u64, tx: Sender<Trigger>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The open track played to its end
    pub fn media_ended(&self) {
        self.push(Trigger::MediaEnded {
            generation: self.generation,
        });
    }

    pub fn state_changed(&self, state: MediaState) {
        self.push(Trigger::MediaStateChanged {
            generation: self.generation,
            state,
        });
    }

    fn push(&self, trigger: Trigger) {
        match self.tx.try_send(trigger) {
            Ok(()) => {}
            Err(TrySendError::Full(t)) => {
                log::warn!("Engine queue full, dropped media event {}", t.name());
            }
            Err(TrySendError::Disconnected(t)) => {
                log::debug!("Engine gone, dropped media event {}", t.name());
            }
        }
    }
}
