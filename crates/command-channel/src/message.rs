// crates/command-channel/src/message.rs
//! Ordered key/value command messages

use crate::error::ChannelResult;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Well-known message keys
pub mod keys {
    /// Foreground is ready; payload ignored
    pub const START: &str = "START";
    /// Set the current file index; payload is an integer or numeric string
    pub const CURRENT_FILE_INDEX: &str = "CURRENTFILEINDEX";
    /// Re-open the current track without playing
    pub const RELOAD: &str = "RELOAD";
    /// Advance to the next track and play
    pub const NEXT: &str = "NEXT";
    /// Step back to the previous track and play
    pub const PREVIOUS: &str = "PREVIOUS";
}

/// Payload of one message entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandValue {
    Int(i64),
    Text(String),
}

impl CommandValue {
    /// Integer view of the payload; non-numeric text yields `None`
    pub fn as_int(&self) -> Option<i64> {
        match self {
            CommandValue::Int(v) => Some(*v),
            CommandValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for CommandValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandValue::Int(v) => write!(f, "{}", v),
            CommandValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for CommandValue {
    fn from(v: i64) -> Self {
        CommandValue::Int(v)
    }
}

impl From<usize> for CommandValue {
    fn from(v: usize) -> Self {
        i64::try_from(v).map_or_else(|_| CommandValue::Text(v.to_string()), CommandValue::Int)
    }
}

impl From<&str> for CommandValue {
    fn from(s: &str) -> Self {
        CommandValue::Text(s.to_string())
    }
}

impl From<String> for CommandValue {
    fn from(s: String) -> Self {
        CommandValue::Text(s)
    }
}

/// An ordered set of `(key, value)` entries
///
/// Entries keep insertion order, including on the JSON wire form, because the
/// receiver applies them in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandMessage {
    entries: Vec<(String, CommandValue)>,
}

impl CommandMessage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A message with one entry
    pub fn single(key: impl Into<String>, value: impl Into<CommandValue>) -> Self {
        Self::new().with(key, value)
    }

    /// Appends an entry
    pub fn with(mut self, key: impl Into<String>, value: impl Into<CommandValue>) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<CommandValue>) {
        self.entries.push((key.into(), value.into()));
    }

    pub fn entries(&self) -> &[(String, CommandValue)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses the JSON object form, e.g. `{"CURRENTFILEINDEX": 4, "RELOAD": "0"}`
    pub fn from_json(text: &str) -> ChannelResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> ChannelResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl fmt::Display for CommandMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in &self.entries {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", key, value)?;
            first = false;
        }
        Ok(())
    }
}

impl Serialize for CommandMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct MessageVisitor;

impl<'de> Visitor<'de> for MessageVisitor {
    type Value = CommandMessage;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of command keys to string or integer values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut message = CommandMessage::new();
        while let Some((key, value)) = access.next_entry::<String, CommandValue>()? {
            message.push(key, value);
        }
        Ok(message)
    }
}

impl<'de> Deserialize<'de> for CommandMessage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(MessageVisitor)
    }
}
