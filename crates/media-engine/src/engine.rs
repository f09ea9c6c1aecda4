//! Playback state machine, run on the engine thread

use crate::error::EngineResult;
use crate::events::{EngineEvent, EventBus};
use crate::output::{MediaEventSink, MediaOutput};
use crate::state::{EngineStatus, OpenMedia, PlaybackSession};
use crate::trigger::Trigger;
use crossbeam_channel::Sender;
use lectern_command_channel::CommandChannel;
use lectern_core::{Catalog, MediaState};
use lectern_resilience::StartupBarrier;
use lectern_transport::TransportControlAdapter;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Tunables for one engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Bound of the serialized trigger queue
    pub trigger_queue_capacity: usize,
    /// Bound of each event subscription
    pub event_queue_capacity: usize,
    /// Play the next track when the current one ends
    pub auto_advance: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trigger_queue_capacity: 64,
            event_queue_capacity: 64,
            auto_advance: true,
        }
    }
}

/// Everything an engine shares with the host that outlives it
#[derive(Clone)]
pub struct EngineContext {
    pub catalog: Arc<Catalog>,
    pub channel: CommandChannel,
    pub barrier: StartupBarrier,
    pub adapter: Option<TransportControlAdapter>,
    pub events: EventBus,
    pub status: Arc<Mutex<EngineStatus>>,
    pub config: EngineConfig,
}

impl EngineContext {
    pub fn new(catalog: Arc<Catalog>, channel: CommandChannel, config: EngineConfig) -> Self {
        Self {
            catalog,
            channel,
            barrier: StartupBarrier::new(),
            adapter: None,
            events: EventBus::new(config.event_queue_capacity),
            status: Arc::new(Mutex::new(EngineStatus::default())),
            config,
        }
    }

    pub fn with_adapter(mut self, adapter: TransportControlAdapter) -> Self {
        self.adapter = Some(adapter);
        self
    }

    pub(crate) fn lock_status(&self) -> MutexGuard<'_, EngineStatus> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The session plus the output it drives
///
/// Only the engine thread touches an `EngineCore`; every input reaches it as a
/// [`Trigger`] through [`EngineCore::handle`].
pub(crate) struct EngineCore {
    ctx: EngineContext,
    output: Box<dyn MediaOutput>,
    session: PlaybackSession,
    trigger_tx: Sender<Trigger>,
}

impl EngineCore {
    pub fn new(ctx: EngineContext, output: Box<dyn MediaOutput>, trigger_tx: Sender<Trigger>) -> Self {
        Self {
            ctx,
            output,
            session: PlaybackSession::default(),
            trigger_tx,
        }
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    #[cfg(test)]
    pub fn current_file_index(&self) -> usize {
        self.session.current_file_index
    }

    #[cfg(test)]
    pub fn transport_state(&self) -> MediaState {
        self.session.transport_state
    }

    /// Marks the engine running and tells everyone
    pub fn started(&mut self) {
        {
            let mut status = self.ctx.lock_status();
            *status = EngineStatus {
                running: true,
                ..EngineStatus::default()
            };
        }
        if let Some(adapter) = &self.ctx.adapter {
            adapter.enable_buttons();
        }
        self.ctx.barrier.raise();
        self.ctx.events.publish(EngineEvent::Started);
        log::info!(
            "Playback engine started at track {}",
            self.session.current_file_index
        );
    }

    pub fn handle(&mut self, trigger: Trigger) {
        log::debug!(
            "Trigger {} in state {} at track {}",
            trigger.name(),
            self.session.transport_state,
            self.session.current_file_index
        );

        let result = match trigger {
            Trigger::PlayFile { book, chapter } => {
                let index = match self.ctx.catalog.file_index(book, chapter) {
                    Ok(index) => index,
                    Err(e) => {
                        log::warn!("PlayFile({}, {}): {}, using track 0", book, chapter, e);
                        0
                    }
                };
                self.session.current_file_index = index;
                self.open_and_play()
            }
            Trigger::Play => self.play(),
            Trigger::PlayOrStart { book } => self.play_or_start(book),
            Trigger::Pause => self.pause(),
            Trigger::Stop => {
                self.stop();
                Ok(())
            }
            Trigger::Next => {
                self.session.current_file_index = self
                    .ctx
                    .catalog
                    .next_file_index(self.session.current_file_index);
                self.open_and_play()
            }
            Trigger::Previous => {
                self.session.current_file_index = self
                    .ctx
                    .catalog
                    .previous_file_index(self.session.current_file_index);
                self.open_and_play()
            }
            Trigger::SetFileIndex(index) => {
                self.set_file_index(index);
                Ok(())
            }
            Trigger::Reload => self.open_current(),
            Trigger::ForegroundReady => {
                log::debug!("Foreground ready");
                self.ctx.barrier.raise();
                Ok(())
            }
            Trigger::MediaEnded { generation } => self.media_ended(generation),
            Trigger::MediaStateChanged { generation, state } => {
                if self.session.is_current(generation) {
                    log::trace!("Output reported {} for generation {}", state, generation);
                } else {
                    log::debug!("Ignoring {} from released generation {}", state, generation);
                }
                Ok(())
            }
            Trigger::Shutdown => {
                self.shutdown();
                Ok(())
            }
        };

        if let Err(e) = result {
            self.fail(e.to_string());
        }
        self.sync_state();
        self.refresh_status();
    }

    fn play(&mut self) -> EngineResult<()> {
        match self.session.transport_state {
            state if state.needs_open() => self.open_and_play(),
            MediaState::Paused if self.session.media.is_some() => {
                self.output.play()?;
                Ok(())
            }
            MediaState::Paused => self.open_and_play(),
            other => {
                log::debug!("Play ignored while {}", other);
                Ok(())
            }
        }
    }

    fn play_or_start(&mut self, book: usize) -> EngineResult<()> {
        match self.session.transport_state {
            MediaState::Paused if self.session.media.is_some() => {
                self.output.play()?;
                Ok(())
            }
            state if state.is_active() => {
                log::debug!("PlayOrStart ignored while {}", state);
                Ok(())
            }
            _ => {
                self.session.current_file_index =
                    self.ctx.catalog.file_index(book, 0).unwrap_or_else(|e| {
                        log::warn!("PlayOrStart({}): {}, using track 0", book, e);
                        0
                    });
                self.open_and_play()
            }
        }
    }

    fn pause(&mut self) -> EngineResult<()> {
        if self.session.transport_state == MediaState::Playing {
            self.output.pause()?;
        } else {
            log::debug!("Pause ignored while {}", self.session.transport_state);
        }
        Ok(())
    }

    fn set_file_index(&mut self, index: i64) {
        let index = usize::try_from(index)
            .ok()
            .filter(|i| self.ctx.catalog.contains(*i))
            .unwrap_or_else(|| {
                log::warn!(
                    "File index {} outside 0..{}, using track 0",
                    index,
                    self.ctx.catalog.total_tracks()
                );
                0
            });
        self.session.current_file_index = index;
    }

    fn media_ended(&mut self, generation: u64) -> EngineResult<()> {
        if !self.session.is_current(generation) {
            log::debug!("Ignoring media end from released generation {}", generation);
            return Ok(());
        }
        // Stopped here means the output already reported the end itself
        if !matches!(
            self.session.transport_state,
            MediaState::Playing | MediaState::Stopped
        ) {
            log::debug!("Media ended while {}", self.session.transport_state);
            return Ok(());
        }
        if !self.ctx.config.auto_advance {
            log::info!("Track {} finished", self.session.current_file_index);
            return Ok(());
        }

        self.session.current_file_index = self
            .ctx
            .catalog
            .next_file_index(self.session.current_file_index);
        log::info!("Advancing to track {}", self.session.current_file_index);
        self.open_and_play()
    }

    fn open_and_play(&mut self) -> EngineResult<()> {
        self.open_current()?;
        self.output.play()?;
        Ok(())
    }

    /// Replaces the open media with the current track, leaving it paused
    fn open_current(&mut self) -> EngineResult<()> {
        let index = self.session.current_file_index;
        let uri = self.ctx.catalog.file_uri(index)?;
        let title = self.ctx.catalog.track_name(index)?;

        if self.session.media.take().is_some() {
            self.output.close();
        }
        self.set_state(MediaState::Opening);

        let generation = self.session.next_generation();
        self.session.media = Some(OpenMedia {
            generation,
            uri: uri.clone(),
        });
        let sink = MediaEventSink::new(generation, self.trigger_tx.clone());
        if let Err(e) = self.output.open(&uri, sink) {
            self.session.media = None;
            return Err(e.into());
        }

        log::info!("Opened track {} ({}) at {}", index, title, uri);
        self.ctx.events.publish(EngineEvent::TrackChanged {
            file_index: index,
            title,
            uri,
        });
        Ok(())
    }

    fn stop(&mut self) {
        self.session.media = None;
        self.output.close();
        self.set_state(MediaState::Stopped);
        self.set_state(MediaState::Closed);
        if let Some(adapter) = &self.ctx.adapter {
            adapter.on_closed();
        }
    }

    /// Falls back to `Closed` and reports the failure
    fn fail(&mut self, message: String) {
        let file_index = self.session.current_file_index;
        log::warn!("Playback of track {} failed: {}", file_index, message);

        self.session.media = None;
        self.output.close();
        self.set_state(MediaState::Closed);
        self.ctx.lock_status().last_error = Some(message.clone());
        if let Some(adapter) = &self.ctx.adapter {
            adapter.on_closed();
        }
        self.ctx
            .events
            .publish(EngineEvent::Error { file_index, message });
    }

    /// Adopts the output's state; intermediate states reported by queued
    /// events are never replayed
    fn sync_state(&mut self) {
        let state = if self.session.media.is_some() {
            self.output.state()
        } else {
            MediaState::Closed
        };
        self.set_state(state);
    }

    fn set_state(&mut self, state: MediaState) {
        if self.session.transport_state == state {
            return;
        }
        log::debug!("State {} -> {}", self.session.transport_state, state);
        self.session.transport_state = state;

        let file_index = self.session.current_file_index;
        {
            let mut status = self.ctx.lock_status();
            status.state = state;
            status.file_index = file_index;
        }
        if let Some(adapter) = &self.ctx.adapter {
            adapter.on_state_changed(state, file_index);
        }
        self.ctx
            .events
            .publish(EngineEvent::StateChanged { state, file_index });
    }

    fn refresh_status(&self) {
        let index = self.session.current_file_index;
        let mut status = self.ctx.lock_status();
        status.state = self.session.transport_state;
        status.file_index = index;
        status.title = self.ctx.catalog.track_name(index).ok();
        status.uri = self.session.media.as_ref().map(|m| m.uri.clone());
    }

    /// Releases the output; the engine thread exits afterwards
    pub fn shutdown(&mut self) {
        self.session.media = None;
        self.output.close();
        self.set_state(MediaState::Closed);
        self.refresh_status();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::{OutputCall, SimulatedOutput};
    use crossbeam_channel::{bounded, Receiver};
    use lectern_core::BookEntry;

    fn engine_core(auto_advance: bool) -> (EngineCore, SimulatedOutput, Receiver<Trigger>, Receiver<EngineEvent>) {
        let catalog = Catalog::from_books(vec![
            BookEntry::new("Ruth", 2),
            BookEntry::new("Jude", 1),
            BookEntry::new("Jonah", 3),
        ])
        .unwrap();
        let config = EngineConfig {
            auto_advance,
            ..EngineConfig::default()
        };
        let ctx = EngineContext::new(Arc::new(catalog), CommandChannel::new(4), config);
        let events = ctx.events.subscribe();
        let output = SimulatedOutput::new();
        let (tx, rx) = bounded(64);
        (EngineCore::new(ctx, Box::new(output.clone()), tx), output, rx, events)
    }

    /// Feeds queued output events back in, as the engine thread would
    fn pump(engine: &mut EngineCore, rx: &Receiver<Trigger>) {
        while let Ok(trigger) = rx.try_recv() {
            engine.handle(trigger);
        }
    }

    #[test]
    fn test_play_from_closed_opens_current() {
        let (mut engine, output, rx, _events) = engine_core(true);
        engine.handle(Trigger::Play);
        pump(&mut engine, &rx);

        assert_eq!(output.open_count(), 1);
        assert_eq!(engine.transport_state(), MediaState::Playing);
    }

    #[test]
    fn test_play_from_paused_resumes_without_open() {
        let (mut engine, output, rx, _events) = engine_core(true);
        engine.handle(Trigger::Play);
        engine.handle(Trigger::Pause);
        pump(&mut engine, &rx);
        assert_eq!(engine.transport_state(), MediaState::Paused);

        output.clear_calls();
        engine.handle(Trigger::Play);
        assert_eq!(output.calls(), vec![OutputCall::Play]);
        assert_eq!(engine.transport_state(), MediaState::Playing);
    }

    #[test]
    fn test_play_or_start_resumes_paused_track() {
        let (mut engine, output, rx, _events) = engine_core(true);
        engine.handle(Trigger::PlayFile { book: 2, chapter: 2 });
        engine.handle(Trigger::Pause);
        pump(&mut engine, &rx);

        output.clear_calls();
        engine.handle(Trigger::PlayOrStart { book: 0 });
        assert_eq!(output.calls(), vec![OutputCall::Play]);
        assert_eq!(engine.current_file_index(), 5);
    }

    #[test]
    fn test_play_or_start_from_closed_starts_book() {
        let (mut engine, output, _rx, _events) = engine_core(true);
        engine.handle(Trigger::PlayOrStart { book: 2 });
        assert_eq!(engine.current_file_index(), 3);
        assert_eq!(output.open_count(), 1);

        engine.handle(Trigger::PlayOrStart { book: 0 });
        assert_eq!(engine.current_file_index(), 3);
        assert_eq!(output.open_count(), 1);
    }

    #[test]
    fn test_play_file_resolves_index() {
        let (mut engine, output, _rx, _events) = engine_core(true);
        engine.handle(Trigger::PlayFile { book: 2, chapter: 1 });
        assert_eq!(engine.current_file_index(), 4);
        assert_eq!(
            output.current_uri().as_deref(),
            Some("file:///usr/share/lectern/audio/03_002.mp3")
        );
    }

    #[test]
    fn test_play_file_out_of_range_uses_zero() {
        let (mut engine, _output, _rx, _events) = engine_core(true);
        engine.handle(Trigger::PlayFile { book: 9, chapter: 0 });
        assert_eq!(engine.current_file_index(), 0);
        assert_eq!(engine.transport_state(), MediaState::Playing);
    }

    #[test]
    fn test_set_file_index_clamps_without_opening() {
        let (mut engine, output, _rx, _events) = engine_core(true);
        engine.handle(Trigger::SetFileIndex(3));
        assert_eq!(engine.current_file_index(), 3);
        engine.handle(Trigger::SetFileIndex(6));
        assert_eq!(engine.current_file_index(), 0);
        engine.handle(Trigger::SetFileIndex(-1));
        assert_eq!(engine.current_file_index(), 0);
        assert_eq!(output.open_count(), 0);
    }

    #[test]
    fn test_reload_opens_without_playing() {
        let (mut engine, output, rx, _events) = engine_core(true);
        engine.handle(Trigger::SetFileIndex(2));
        engine.handle(Trigger::Reload);
        pump(&mut engine, &rx);

        assert_eq!(output.open_count(), 1);
        assert!(!output.calls().contains(&OutputCall::Play));
        assert_eq!(engine.transport_state(), MediaState::Paused);
        assert_eq!(engine.current_file_index(), 2);
    }

    #[test]
    fn test_media_end_advances_once() {
        let (mut engine, output, rx, _events) = engine_core(true);
        engine.handle(Trigger::SetFileIndex(5));
        engine.handle(Trigger::Play);
        pump(&mut engine, &rx);

        assert!(output.finish_track());
        pump(&mut engine, &rx);

        assert_eq!(engine.current_file_index(), 0);
        assert_eq!(output.open_count(), 2);
        assert_eq!(engine.transport_state(), MediaState::Playing);
    }

    #[test]
    fn test_media_end_without_auto_advance_stops() {
        let (mut engine, output, rx, _events) = engine_core(false);
        engine.handle(Trigger::Play);
        pump(&mut engine, &rx);
        output.finish_track();
        pump(&mut engine, &rx);

        assert_eq!(engine.current_file_index(), 0);
        assert_eq!(engine.transport_state(), MediaState::Stopped);
    }

    #[test]
    fn test_stale_media_end_ignored() {
        let (mut engine, output, rx, _events) = engine_core(true);
        engine.handle(Trigger::Play);
        pump(&mut engine, &rx);
        engine.handle(Trigger::Next);
        pump(&mut engine, &rx);
        assert_eq!(engine.current_file_index(), 1);

        engine.handle(Trigger::MediaEnded { generation: 1 });
        assert_eq!(engine.current_file_index(), 1);
        assert_eq!(output.open_count(), 2);
    }

    #[test]
    fn test_open_failure_reports_and_closes() {
        let (mut engine, output, _rx, events) = engine_core(true);
        output.fail_next_open("no such file");
        engine.handle(Trigger::Play);

        assert_eq!(engine.transport_state(), MediaState::Closed);
        let error = events
            .try_iter()
            .find(|e| matches!(e, EngineEvent::Error { .. }));
        assert!(matches!(error, Some(EngineEvent::Error { file_index: 0, .. })));
        assert!(engine.context().lock_status().last_error.is_some());
    }

    #[test]
    fn test_stop_closes_output() {
        let (mut engine, output, rx, events) = engine_core(true);
        engine.handle(Trigger::Play);
        pump(&mut engine, &rx);
        let _ = events.try_iter().count();

        engine.handle(Trigger::Stop);
        assert_eq!(output.state(), MediaState::Closed);
        let states: Vec<MediaState> = events
            .try_iter()
            .filter_map(|e| match e {
                EngineEvent::StateChanged { state, .. } => Some(state),
                _ => None,
            })
            .collect();
        assert_eq!(states, vec![MediaState::Stopped, MediaState::Closed]);
    }

    #[test]
    fn test_track_change_passes_through_opening() {
        let (mut engine, _output, rx, events) = engine_core(true);
        engine.handle(Trigger::Play);
        pump(&mut engine, &rx);
        let _ = events.try_iter().count();

        engine.handle(Trigger::Next);
        let seen: Vec<EngineEvent> = events.try_iter().collect();
        assert_eq!(
            seen,
            vec![
                EngineEvent::StateChanged {
                    state: MediaState::Opening,
                    file_index: 1
                },
                EngineEvent::TrackChanged {
                    file_index: 1,
                    title: "Jude".to_string(),
                    uri: "file:///usr/share/lectern/audio/02_001.mp3".to_string()
                },
                EngineEvent::StateChanged {
                    state: MediaState::Playing,
                    file_index: 1
                },
            ]
        );
    }
}
