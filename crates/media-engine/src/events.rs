// FILE: crates/media-engine/src/events.rs

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use lectern_core::MediaState;
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};

/// Notifications published by the engine to its subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Engine thread is up and accepting triggers
    Started,
    StateChanged { state: MediaState, file_index: usize },
    /// A new track was opened
    TrackChanged {
        file_index: usize,
        title: String,
        uri: String,
    },
    /// Opening or playing failed; the session fell back to closed
    Error { file_index: usize, message: String },
    /// Engine released its output and exited; `rejected` triggers were discarded
    Stopped { rejected: u64 },
}

/// Fan-out of engine events to any number of bounded subscriptions
///
/// Slow subscribers lose events rather than stalling the engine; dropped
/// receivers are pruned on the next publish. Clones share subscribers, which
/// lets a host keep subscriptions alive across engine restarts.
#[derive(Debug, Clone)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Sender<EngineEvent>>>>,
    capacity: usize,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
            capacity: capacity.max(1),
        }
    }

    pub fn subscribe(&self) -> Receiver<EngineEvent> {
        let (tx, rx) = bounded(self.capacity);
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn publish(&self, event: EngineEvent) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::warn!("Event subscriber lagging, dropped {:?}", event);
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
    }
}
