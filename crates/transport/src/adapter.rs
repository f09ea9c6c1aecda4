// crates/transport/src/adapter.rs
//! Transport control adapter and startup barrier

use crate::display::{PlaybackStatus, TransportButton, TransportDisplay};
use crate::error::{TransportError, TransportResult};
use crate::surface::TransportSurface;
use lectern_core::{Catalog, MediaState};
use lectern_resilience::{ResilienceError, StartupBarrier, Timeout};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Whatever executes button presses: normally the engine host
pub trait PlaybackTarget: Send + Sync {
    /// True once the engine has finished starting and until it is cancelled
    fn is_running(&self) -> bool;

    /// Signal raised when the engine finishes starting
    fn startup_barrier(&self) -> StartupBarrier;

    /// Queues the button's action; false when no engine accepted it
    fn submit_button(&self, button: TransportButton) -> bool;
}

/// What happened to a button press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonOutcome {
    /// Queued on a running engine
    Dispatched,
    /// Play that first waited for the engine to start
    DispatchedAfterStartup,
    /// Pause/Next/Previous with no running engine; nothing happens
    Dropped,
}

struct State {
    surface: Box<dyn TransportSurface>,
    display: TransportDisplay,
}

struct Inner {
    state: Mutex<State>,
    catalog: Arc<Catalog>,
    startup_timeout: Timeout,
}

/// Bridges the engine and the platform transport surface
///
/// Clones share the same surface and display state; the engine thread keeps
/// one to publish state changes while a button thread keeps another.
#[derive(Clone)]
pub struct TransportControlAdapter {
    inner: Arc<Inner>,
}

impl TransportControlAdapter {
    pub fn new<S>(surface: S, catalog: Arc<Catalog>, startup_timeout: Timeout) -> Self
    where
        S: TransportSurface + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    surface: Box::new(surface),
                    display: TransportDisplay::default(),
                }),
                catalog,
                startup_timeout,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn modify<F>(&self, change: F)
    where
        F: FnOnce(&mut TransportDisplay),
    {
        let mut state = self.lock();
        let before = state.display.clone();
        change(&mut state.display);
        if state.display != before {
            let State { surface, display } = &mut *state;
            surface.update(display);
        }
    }

    pub fn startup_timeout(&self) -> Timeout {
        self.inner.startup_timeout
    }

    /// Current display snapshot
    pub fn display(&self) -> TransportDisplay {
        self.lock().display.clone()
    }

    /// Enables all four buttons; called when the engine starts
    pub fn enable_buttons(&self) {
        self.modify(|display| display.set_all_enabled(true));
    }

    /// Reflects an engine state change on the surface
    ///
    /// Playing sets the status and the track title, Paused sets the status.
    /// Other states leave the display unchanged; closing is explicit through
    /// [`TransportControlAdapter::on_closed`].
    pub fn on_state_changed(&self, state: MediaState, file_index: usize) {
        match state {
            MediaState::Playing => {
                let title = match self.inner.catalog.track_name(file_index) {
                    Ok(title) => Some(title),
                    Err(e) => {
                        log::warn!("No display title for track {}: {}", file_index, e);
                        None
                    }
                };
                self.modify(|display| {
                    display.playback_status = PlaybackStatus::Playing;
                    if title.is_some() {
                        display.display_title = title;
                    }
                });
            }
            MediaState::Paused => {
                self.modify(|display| display.playback_status = PlaybackStatus::Paused);
            }
            other => log::trace!("Transport display unchanged for {}", other),
        }
    }

    /// The session was explicitly stopped, failed, or the engine went away
    pub fn on_closed(&self) {
        self.modify(|display| display.playback_status = PlaybackStatus::Closed);
    }

    /// Handles a hardware/OS button press
    ///
    /// Play blocks the calling thread on the startup barrier when the engine
    /// is not running yet and fails with [`TransportError::StartupTimeout`]
    /// if it does not come up in time. Pause, Next and Previous never wait:
    /// without a running engine they return [`ButtonOutcome::Dropped`]. A
    /// running engine that refuses a button, e.g. because its queue is full,
    /// yields [`TransportError::Rejected`].
    pub fn handle_button(
        &self,
        button: TransportButton,
        target: &dyn PlaybackTarget,
    ) -> TransportResult<ButtonOutcome> {
        log::debug!("Transport button pressed: {}", button);

        match button {
            TransportButton::Play => {
                let waited = !target.is_running();
                if waited {
                    log::info!(
                        "Play pressed before the engine started, waiting up to {:?}",
                        self.inner.startup_timeout.duration()
                    );
                    self.inner
                        .startup_timeout
                        .wait_for(&target.startup_barrier())
                        .map_err(|e| match e {
                            ResilienceError::Timeout(d) => TransportError::StartupTimeout(d),
                            ResilienceError::Cancelled => TransportError::StartupCancelled,
                        })?;
                }

                if !target.submit_button(button) {
                    return Err(TransportError::Rejected(button.to_string()));
                }
                Ok(if waited {
                    ButtonOutcome::DispatchedAfterStartup
                } else {
                    ButtonOutcome::Dispatched
                })
            }
            TransportButton::Pause | TransportButton::Next | TransportButton::Previous => {
                if !target.is_running() {
                    log::warn!("{} pressed with no running engine, dropped", button);
                    return Ok(ButtonOutcome::Dropped);
                }
                if !target.submit_button(button) {
                    log::warn!("Running engine refused {}", button);
                    return Err(TransportError::Rejected(button.to_string()));
                }
                Ok(ButtonOutcome::Dispatched)
            }
        }
    }
}
