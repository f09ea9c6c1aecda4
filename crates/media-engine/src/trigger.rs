// FILE: crates/media-engine/src/trigger.rs

use lectern_command_channel::Command;
use lectern_core::MediaState;
use lectern_transport::TransportButton;

/// Everything the engine reacts to, funnelled through one serialized queue
///
/// Direct calls, command channel messages, transport buttons and media output
/// callbacks all become triggers so that no two of them ever observe the
/// session concurrently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Resolve `(book, chapter)`, open it and play
    PlayFile { book: usize, chapter: usize },
    /// Resume when paused, reopen the current track when closed or stopped
    Play,
    /// Resume when paused with a track loaded, otherwise play chapter 0 of
    /// `book`; nothing while already playing
    PlayOrStart { book: usize },
    Pause,
    /// Stop and release the media output
    Stop,
    Next,
    Previous,
    /// Move the cursor without opening anything; out-of-range clamps to 0
    SetFileIndex(i64),
    /// Reopen the current track without playing
    Reload,
    /// Foreground announced itself
    ForegroundReady,
    /// The output finished the track opened as `generation`
    MediaEnded { generation: u64 },
    /// The output opened as `generation` changed state
    MediaStateChanged { generation: u64, state: MediaState },
    /// Release everything and exit the engine thread
    Shutdown,
}

impl Trigger {
    pub fn name(&self) -> &'static str {
        match self {
            Trigger::PlayFile { .. } => "PlayFile",
            Trigger::Play => "Play",
            Trigger::PlayOrStart { .. } => "PlayOrStart",
            Trigger::Pause => "Pause",
            Trigger::Stop => "Stop",
            Trigger::Next => "Next",
            Trigger::Previous => "Previous",
            Trigger::SetFileIndex(_) => "SetFileIndex",
            Trigger::Reload => "Reload",
            Trigger::ForegroundReady => "ForegroundReady",
            Trigger::MediaEnded { .. } => "MediaEnded",
            Trigger::MediaStateChanged { .. } => "MediaStateChanged",
            Trigger::Shutdown => "Shutdown",
        }
    }
}

impl From<Command> for Trigger {
    fn from(command: Command) -> Self {
        match command {
            Command::Start => Trigger::ForegroundReady,
            Command::SetFileIndex(index) => Trigger::SetFileIndex(index),
            Command::Reload => Trigger::Reload,
            Command::Next => Trigger::Next,
            Command::Previous => Trigger::Previous,
        }
    }
}

impl From<TransportButton> for Trigger {
    fn from(button: TransportButton) -> Self {
        match button {
            TransportButton::Play => Trigger::Play,
            TransportButton::Pause => Trigger::Pause,
            TransportButton::Next => Trigger::Next,
            TransportButton::Previous => Trigger::Previous,
        }
    }
}
