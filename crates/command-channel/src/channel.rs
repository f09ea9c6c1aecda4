// crates/command-channel/src/channel.rs
//! Fire-and-forget delivery with an attachable receiver

use crate::message::CommandMessage;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// Why a message was not delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// No engine is attached; the message is lost
    NoReceiver,
    /// The receiver's queue is full
    QueueFull,
    /// The attached receiver went away
    Disconnected,
}

/// Outcome of [`CommandChannel::send`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    Dropped(DropReason),
}

impl Delivery {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Delivery::Delivered)
    }
}

/// Counters for sent messages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelStats {
    pub delivered: u64,
    pub dropped: u64,
}

#[derive(Debug)]
struct Shared {
    slot: RwLock<Option<Sender<CommandMessage>>>,
    capacity: usize,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

/// Sending side of the foreground-to-engine channel
///
/// Clones share one channel. Messages from one sender arrive in send order.
/// A message sent while nothing is attached is dropped: the caller gets
/// [`Delivery::Dropped`] and must not assume it will be replayed.
#[derive(Debug, Clone)]
pub struct CommandChannel {
    shared: Arc<Shared>,
}

impl CommandChannel {
    /// Creates a channel whose receivers buffer at most `capacity` messages
    pub fn new(capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                slot: RwLock::new(None),
                capacity: capacity.max(1),
                delivered: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
            }),
        }
    }

    /// Attaches a new receiver, replacing (and disconnecting) any previous one
    pub fn attach(&self) -> CommandReceiver {
        let (tx, rx) = bounded(self.shared.capacity);
        let mut slot = self
            .shared
            .slot
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.replace(tx).is_some() {
            log::debug!("Command channel receiver replaced");
        }
        CommandReceiver { rx }
    }

    /// Detaches the current receiver; later sends are dropped
    pub fn detach(&self) {
        let mut slot = self
            .shared
            .slot
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.take().is_some() {
            log::debug!("Command channel receiver detached");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.shared
            .slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Sends without blocking
    pub fn send(&self, message: CommandMessage) -> Delivery {
        let outcome = {
            let slot = self
                .shared
                .slot
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                None => Delivery::Dropped(DropReason::NoReceiver),
                Some(tx) => match tx.try_send(message.clone()) {
                    Ok(()) => Delivery::Delivered,
                    Err(TrySendError::Full(_)) => Delivery::Dropped(DropReason::QueueFull),
                    Err(TrySendError::Disconnected(_)) => {
                        Delivery::Dropped(DropReason::Disconnected)
                    }
                },
            }
        };

        match outcome {
            Delivery::Delivered => {
                self.shared.delivered.fetch_add(1, Ordering::Relaxed);
                log::debug!("Command delivered: {}", message);
            }
            Delivery::Dropped(reason) => {
                self.shared.dropped.fetch_add(1, Ordering::Relaxed);
                log::warn!("Command dropped ({:?}): {}", reason, message);
            }
        }
        outcome
    }

    pub fn stats(&self) -> ChannelStats {
        ChannelStats {
            delivered: self.shared.delivered.load(Ordering::Relaxed),
            dropped: self.shared.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Receiving side, owned by one engine instance
#[derive(Debug)]
pub struct CommandReceiver {
    rx: Receiver<CommandMessage>,
}

impl CommandReceiver {
    pub fn try_recv(&self) -> Option<CommandMessage> {
        self.rx.try_recv().ok()
    }

    /// Waits up to `timeout`; `None` on timeout or once detached and drained
    pub fn recv_timeout(&self, timeout: Duration) -> Option<CommandMessage> {
        match self.rx.recv_timeout(timeout) {
            Ok(message) => Some(message),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Messages already queued, without waiting
    pub fn drain(&self) -> Vec<CommandMessage> {
        self.rx.try_iter().collect()
    }

    /// Underlying receiver, for use in `crossbeam_channel::select!`
    pub fn as_receiver(&self) -> &Receiver<CommandMessage> {
        &self.rx
    }
}
