// crates/transport/src/surface.rs
//! Platform transport surfaces

use crate::display::TransportDisplay;
use std::sync::{Arc, Mutex, PoisonError};

/// Receives display updates from the adapter
///
/// Implementations wrap MPRIS, SMTC, a lock-screen widget, or a console.
pub trait TransportSurface: Send {
    fn update(&mut self, display: &TransportDisplay);
}

/// In-memory surface that keeps every update it receives
///
/// Clones share the same history, so a host can hand one clone to the adapter
/// and read the other.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    history: Arc<Mutex<Vec<TransportDisplay>>>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<TransportDisplay> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn history(&self) -> Vec<TransportDisplay> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Titles shown so far, without consecutive repeats
    pub fn titles(&self) -> Vec<String> {
        let mut titles: Vec<String> = Vec::new();
        for title in self.history().into_iter().filter_map(|d| d.display_title) {
            if titles.last() != Some(&title) {
                titles.push(title);
            }
        }
        titles
    }
}

impl TransportSurface for MemorySurface {
    fn update(&mut self, display: &TransportDisplay) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(display.clone());
    }
}
