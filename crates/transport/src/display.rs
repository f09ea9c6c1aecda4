// crates/transport/src/display.rs
//! Transport display model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hardware/OS transport buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportButton {
    Play,
    Pause,
    Next,
    Previous,
}

impl fmt::Display for TransportButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportButton::Play => "play",
            TransportButton::Pause => "pause",
            TransportButton::Next => "next",
            TransportButton::Previous => "previous",
        };
        f.write_str(name)
    }
}

impl FromStr for TransportButton {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "play" => Ok(TransportButton::Play),
            "pause" => Ok(TransportButton::Pause),
            "next" => Ok(TransportButton::Next),
            "prev" | "previous" => Ok(TransportButton::Previous),
            other => Err(format!("unknown transport button '{}'", other)),
        }
    }
}

/// Status shown by the system transport surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackStatus {
    #[default]
    Closed,
    Stopped,
    Playing,
    Paused,
}

/// Everything the transport surface renders
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransportDisplay {
    pub is_play_enabled: bool,
    pub is_pause_enabled: bool,
    pub is_next_enabled: bool,
    pub is_previous_enabled: bool,
    pub playback_status: PlaybackStatus,
    pub display_title: Option<String>,
}

impl TransportDisplay {
    pub fn is_enabled(&self, button: TransportButton) -> bool {
        match button {
            TransportButton::Play => self.is_play_enabled,
            TransportButton::Pause => self.is_pause_enabled,
            TransportButton::Next => self.is_next_enabled,
            TransportButton::Previous => self.is_previous_enabled,
        }
    }

    pub(crate) fn set_all_enabled(&mut self, enabled: bool) {
        self.is_play_enabled = enabled;
        self.is_pause_enabled = enabled;
        self.is_next_enabled = enabled;
        self.is_previous_enabled = enabled;
    }
}
