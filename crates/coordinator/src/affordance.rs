// crates/coordinator/src/affordance.rs
//! The single play/pause toggle shown in the foreground

use lectern_core::MediaState;
use std::fmt;

/// What the toggle offers to do next
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlayAffordance {
    #[default]
    Play,
    Pause,
}

impl PlayAffordance {
    /// Toggle for an observed engine state
    ///
    /// Anything on its way to sound (opening, buffering, playing) offers Pause.
    pub fn for_state(state: MediaState) -> Self {
        if state.is_active() {
            Self::Pause
        } else {
            Self::Play
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Play => "Play",
            Self::Pause => "Pause",
        }
    }
}

impl fmt::Display for PlayAffordance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
