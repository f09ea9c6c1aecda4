// FILE: crates/media-engine/src/simulated.rs

//! A media output that tracks state without producing sound
//!
//! Used by the CLI and by tests. Clones share state, so one clone can be
//! handed to the engine while another drives track completion and inspects
//! the calls the engine made.

use crate::error::{OutputError, OutputResult};
use crate::output::{MediaEventSink, MediaOutput};
use lectern_core::MediaState;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A call the engine made on the output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputCall {
    Open(String),
    Play,
    Pause,
    Close,
}

#[derive(Debug, Default)]
struct SimState {
    state: MediaState,
    uri: Option<String>,
    sink: Option<MediaEventSink>,
    calls: Vec<OutputCall>,
    fail_next_open: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SimulatedOutput {
    shared: Arc<Mutex<SimState>>,
}

impl SimulatedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every call made so far, oldest first
    pub fn calls(&self) -> Vec<OutputCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn open_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, OutputCall::Open(_)))
            .count()
    }

    pub fn opened_uris(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                OutputCall::Open(uri) => Some(uri.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn current_uri(&self) -> Option<String> {
        self.lock().uri.clone()
    }

    /// Makes the next `open` fail with `reason`
    pub fn fail_next_open(&self, reason: impl Into<String>) {
        self.lock().fail_next_open = Some(reason.into());
    }

    /// Plays the current track to its end
    ///
    /// Reports media-ended followed by a change to `Stopped`. Returns false,
    /// doing nothing, unless a track is playing.
    pub fn finish_track(&self) -> bool {
        let sink = {
            let mut sim = self.lock();
            if sim.state != MediaState::Playing {
                return false;
            }
            sim.state = MediaState::Stopped;
            sim.sink.clone()
        };

        if let Some(sink) = sink {
            sink.media_ended();
            sink.state_changed(MediaState::Stopped);
        }
        true
    }

    fn set_state(&self, state: MediaState) {
        let sink = {
            let mut sim = self.lock();
            if sim.state == state {
                return;
            }
            sim.state = state;
            sim.sink.clone()
        };
        if let Some(sink) = sink {
            sink.state_changed(state);
        }
    }
}

impl MediaOutput for SimulatedOutput {
    fn open(&mut self, uri: &str, events: MediaEventSink) -> OutputResult<()> {
        {
            let mut sim = self.lock();
            sim.calls.push(OutputCall::Open(uri.to_string()));

            if let Some(reason) = sim.fail_next_open.take() {
                sim.uri = None;
                sim.sink = None;
                sim.state = MediaState::Closed;
                return Err(OutputError::OpenFailed {
                    uri: uri.to_string(),
                    reason,
                });
            }

            sim.uri = Some(uri.to_string());
            sim.sink = Some(events);
        }

        // Loaded and ready, not playing yet
        self.set_state(MediaState::Opening);
        self.set_state(MediaState::Paused);
        Ok(())
    }

    fn play(&mut self) -> OutputResult<()> {
        {
            let mut sim = self.lock();
            sim.calls.push(OutputCall::Play);
            if sim.uri.is_none() {
                return Err(OutputError::NotOpen);
            }
        }
        self.set_state(MediaState::Playing);
        Ok(())
    }

    fn pause(&mut self) -> OutputResult<()> {
        let playing = {
            let mut sim = self.lock();
            sim.calls.push(OutputCall::Pause);
            if sim.uri.is_none() {
                return Err(OutputError::NotOpen);
            }
            sim.state == MediaState::Playing
        };
        if playing {
            self.set_state(MediaState::Paused);
        }
        Ok(())
    }

    fn close(&mut self) {
        let mut sim = self.lock();
        sim.calls.push(OutputCall::Close);
        sim.uri = None;
        sim.sink = None;
        sim.state = MediaState::Closed;
    }

    fn state(&self) -> MediaState {
        self.lock().state
    }
}
