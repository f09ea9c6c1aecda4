// crates/command-channel/src/command.rs
//! Decoding of message entries into engine commands

use crate::message::{keys, CommandMessage, CommandValue};

/// A decoded instruction for the playback engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Foreground is ready; releases the startup barrier
    Start,
    /// Set the current file index; range checking is the engine's job
    SetFileIndex(i64),
    /// Re-open the current track without playing
    Reload,
    /// Advance and play
    Next,
    /// Step back and play
    Previous,
}

impl Command {
    /// Decodes one entry; keys match case-insensitively, unknown keys yield `None`
    ///
    /// A `CURRENTFILEINDEX` payload that is not an integer decodes as index 0.
    pub fn decode(key: &str, value: &CommandValue) -> Option<Self> {
        let key = key.trim().to_ascii_uppercase();
        match key.as_str() {
            keys::START => Some(Command::Start),
            keys::CURRENT_FILE_INDEX => Some(Command::SetFileIndex(value.as_int().unwrap_or_else(|| {
                log::warn!("CURRENTFILEINDEX payload {:?} is not a number, using 0", value.to_string());
                0
            }))),
            keys::RELOAD => Some(Command::Reload),
            keys::NEXT => Some(Command::Next),
            keys::PREVIOUS => Some(Command::Previous),
            _ => {
                log::debug!("Ignoring unknown command key {:?}", key);
                None
            }
        }
    }

    /// The message entry that decodes back to this command
    pub fn to_entry(self) -> (&'static str, CommandValue) {
        match self {
            Command::Start => (keys::START, CommandValue::from("0")),
            Command::SetFileIndex(i) => (keys::CURRENT_FILE_INDEX, CommandValue::Int(i)),
            Command::Reload => (keys::RELOAD, CommandValue::from("0")),
            Command::Next => (keys::NEXT, CommandValue::from("0")),
            Command::Previous => (keys::PREVIOUS, CommandValue::from("0")),
        }
    }
}

impl CommandMessage {
    /// Decoded commands in insertion order, unknown keys skipped
    pub fn commands(&self) -> Vec<Command> {
        self.entries()
            .iter()
            .filter_map(|(key, value)| Command::decode(key, value))
            .collect()
    }

    /// Builds a message from commands, preserving their order
    pub fn from_commands(commands: &[Command]) -> Self {
        commands.iter().fold(CommandMessage::new(), |message, command| {
            let (key, value) = command.to_entry();
            message.with(key, value)
        })
    }
}
