//! Transport state shared by the engine, the transport surface and the UI

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of the media output as observed by the playback engine
///
/// `Closed` is the initial state. Any state can fall back to `Stopped` and
/// then `Closed` on an explicit stop or a fatal output error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaState {
    #[default]
    Closed,
    Opening,
    Buffering,
    Playing,
    Paused,
    Stopped,
}

impl MediaState {
    /// States from which `Play` has to open the current track again
    pub fn needs_open(self) -> bool {
        matches!(self, MediaState::Closed | MediaState::Stopped)
    }

    /// States in which a track is loaded or being loaded
    pub fn is_active(self) -> bool {
        matches!(
            self,
            MediaState::Opening | MediaState::Buffering | MediaState::Playing
        )
    }
}

impl fmt::Display for MediaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MediaState::Closed => "closed",
            MediaState::Opening => "opening",
            MediaState::Buffering => "buffering",
            MediaState::Playing => "playing",
            MediaState::Paused => "paused",
            MediaState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}
