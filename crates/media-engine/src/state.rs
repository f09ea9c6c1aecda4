//! Engine session and status snapshot

use lectern_core::MediaState;
use serde::Serialize;

/// The media handle currently open on the output
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OpenMedia {
    pub generation: u64,
    pub uri: String,
}

/// Playback session owned by one engine instance
///
/// `current_file_index` is the only playback cursor in the system. The media
/// handle is opened lazily on the first play and replaced on every track
/// change.
#[derive(Debug, Clone, Default)]
pub(crate) struct PlaybackSession {
    pub current_file_index: usize,
    pub transport_state: MediaState,
    pub media: Option<OpenMedia>,
    generations: u64,
}

impl PlaybackSession {
    /// Allocates the generation for the next opened handle
    pub fn next_generation(&mut self) -> u64 {
        self.generations += 1;
        self.generations
    }

    /// True if events from `generation` belong to the open handle
    pub fn is_current(&self, generation: u64) -> bool {
        self.media
            .as_ref()
            .is_some_and(|m| m.generation == generation)
    }
}

/// Point-in-time view of the engine, readable from any thread
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EngineStatus {
    pub running: bool,
    pub state: MediaState,
    pub file_index: usize,
    pub title: Option<String>,
    pub uri: Option<String>,
    pub last_error: Option<String>,
    pub rejected_triggers: u64,
}
