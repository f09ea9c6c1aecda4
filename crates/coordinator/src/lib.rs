// crates/coordinator/src/lib.rs
//! Lectern foreground coordinator
//!
//! Turns user actions into engine calls and channel messages, and mirrors the
//! engine's reported state into a play/pause affordance.

mod affordance;
mod coordinator;
mod error;

pub use affordance::PlayAffordance;
pub use coordinator::{BookSelection, Coordinator, ObservedPlayback};
pub use error::{CoordinatorError, CoordinatorResult};
