// crates/command-channel/src/lib.rs
//! Best-effort command transport from the foreground to the playback engine
//!
//! A [`CommandMessage`] is an ordered set of `(key, value)` pairs. The engine
//! decodes it into [`Command`]s and applies them in insertion order.
//!
//! Delivery is fire-and-forget: a message sent while no receiver is attached
//! is dropped and counted, never queued for later.
//!
//! ```rust
//! use lectern_command_channel::{CommandChannel, CommandMessage, Delivery, DropReason, keys};
//!
//! let channel = CommandChannel::new(8);
//! let lost = channel.send(CommandMessage::single(keys::NEXT, "0"));
//! assert_eq!(lost, Delivery::Dropped(DropReason::NoReceiver));
//!
//! let receiver = channel.attach();
//! assert!(channel.send(CommandMessage::single(keys::NEXT, "0")).is_delivered());
//! assert!(receiver.try_recv().is_some());
//! ```

mod channel;
mod command;
mod error;
mod message;

pub use channel::{ChannelStats, CommandChannel, CommandReceiver, Delivery, DropReason};
pub use command::Command;
pub use error::{ChannelError, ChannelResult};
pub use message::{keys, CommandMessage, CommandValue};
