// FILE: crates/media-engine/src/host.rs

//! Long-lived owner of the playback engine
//!
//! The host outlives individual engines: subscriptions, the startup barrier
//! and the command channel stay valid across cancel and restart.

use crate::engine::{EngineConfig, EngineContext};
use crate::error::{EngineError, EngineResult};
use crate::events::EngineEvent;
use crate::output::MediaOutput;
use crate::playback_thread::PlaybackEngine;
use crate::state::EngineStatus;
use crate::trigger::Trigger;
use crossbeam_channel::Receiver;
use lectern_command_channel::CommandChannel;
use lectern_core::Catalog;
use lectern_resilience::{BarrierState, StartupBarrier};
use lectern_transport::{PlaybackTarget, TransportButton, TransportControlAdapter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Builds the media output for each new engine
pub type OutputFactory = Box<dyn Fn() -> Box<dyn MediaOutput> + Send + Sync>;

pub struct EngineHost {
    context: EngineContext,
    factory: OutputFactory,
    engine: Mutex<Option<PlaybackEngine>>,
    /// Held for a whole start or cancel, so a new engine never attaches
    /// while a cancelled one is still tearing down the shared context
    lifecycle: Mutex<()>,
}

impl EngineHost {
    pub fn new<F>(catalog: Arc<Catalog>, channel: CommandChannel, config: EngineConfig, factory: F) -> Self
    where
        F: Fn() -> Box<dyn MediaOutput> + Send + Sync + 'static,
    {
        Self {
            context: EngineContext::new(catalog, channel, config),
            factory: Box::new(factory),
            engine: Mutex::new(None),
            lifecycle: Mutex::new(()),
        }
    }

    /// Routes engine state changes to a transport surface
    pub fn with_adapter(mut self, adapter: TransportControlAdapter) -> Self {
        self.context = self.context.clone().with_adapter(adapter);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Option<PlaybackEngine>> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_lifecycle(&self) -> MutexGuard<'_, ()> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.context.catalog
    }

    pub fn channel(&self) -> &CommandChannel {
        &self.context.channel
    }

    pub fn barrier(&self) -> &StartupBarrier {
        &self.context.barrier
    }

    pub fn adapter(&self) -> Option<&TransportControlAdapter> {
        self.context.adapter.as_ref()
    }

    /// Starts an engine unless one is already running
    ///
    /// Returns false when an engine was already running. A new engine always
    /// begins at track 0; nothing from a previous session is restored.
    ///
    /// Waits for a cancel that is still joining the previous engine.
    pub fn start(&self) -> EngineResult<bool> {
        let _lifecycle = self.lock_lifecycle();
        if self.context.barrier.state() == BarrierState::Closed {
            return Err(EngineError::HostClosed);
        }
        let mut slot = self.lock();
        if slot.as_ref().is_some_and(|e| e.is_active()) {
            log::debug!("Playback engine already running");
            return Ok(false);
        }
        if let Some(mut stale) = slot.take() {
            stale.cancel();
        }

        let engine = PlaybackEngine::start(self.context.clone(), (self.factory)())?;
        *slot = Some(engine);
        Ok(true)
    }

    /// Cancels the running engine; false if there was none
    ///
    /// The engine leaves the slot at once, so calls made while it shuts down
    /// fail with [`EngineError::NotRunning`] instead of waiting.
    pub fn cancel(&self) -> bool {
        let _lifecycle = self.lock_lifecycle();
        let engine = self.lock().take();
        match engine {
            Some(mut engine) => {
                log::info!("Cancelling playback engine");
                engine.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancels the engine and closes the startup barrier for good
    ///
    /// A Play press still waiting on the barrier fails at once with a
    /// cancellation instead of running out its timeout. Later starts fail
    /// with [`EngineError::HostClosed`].
    pub fn shutdown(&self) {
        self.cancel();
        self.context.barrier.close();
    }

    pub fn is_running(&self) -> bool {
        self.lock().as_ref().is_some_and(|e| e.is_running())
    }

    pub fn subscribe(&self) -> Receiver<EngineEvent> {
        self.context.events.subscribe()
    }

    pub fn status(&self) -> EngineStatus {
        self.context.lock_status().clone()
    }

    pub fn submit(&self, trigger: Trigger) -> EngineResult<()> {
        match self.lock().as_ref() {
            Some(engine) => engine.submit(trigger),
            None => {
                log::warn!("No playback engine, dropped {}", trigger.name());
                Err(EngineError::NotRunning)
            }
        }
    }

    pub fn play_file(&self, book: usize, chapter: usize) -> EngineResult<()> {
        self.submit(Trigger::PlayFile { book, chapter })
    }

    pub fn play(&self) -> EngineResult<()> {
        self.submit(Trigger::Play)
    }

    /// Resumes a paused track, or starts `book` from its first chapter
    pub fn play_or_start(&self, book: usize) -> EngineResult<()> {
        self.submit(Trigger::PlayOrStart { book })
    }

    pub fn pause(&self) -> EngineResult<()> {
        self.submit(Trigger::Pause)
    }

    pub fn stop(&self) -> EngineResult<()> {
        self.submit(Trigger::Stop)
    }

    pub fn next(&self) -> EngineResult<()> {
        self.submit(Trigger::Next)
    }

    pub fn previous(&self) -> EngineResult<()> {
        self.submit(Trigger::Previous)
    }
}

impl Drop for EngineHost {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl PlaybackTarget for EngineHost {
    fn is_running(&self) -> bool {
        EngineHost::is_running(self)
    }

    fn startup_barrier(&self) -> StartupBarrier {
        self.context.barrier.clone()
    }

    fn submit_button(&self, button: TransportButton) -> bool {
        self.submit(Trigger::from(button)).is_ok()
    }
}
