// crates/coordinator/src/coordinator.rs
//! Foreground side of the playback protocol
//!
//! Play, pause and chapter selection call the engine host directly (starting
//! the engine if needed). Next, previous and cueing go over the best-effort
//! command channel. The only playback state kept here is the last value seen
//! on the engine's event stream.

use crate::affordance::PlayAffordance;
use crate::error::{CoordinatorError, CoordinatorResult};
use crossbeam_channel::Receiver;
use lectern_command_channel::{keys, CommandChannel, CommandMessage, Delivery};
use lectern_core::{Catalog, MediaState};
use lectern_media_engine::{EngineEvent, EngineHost};
use std::sync::Arc;

/// Result of opening a book from the book list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSelection {
    /// Single-chapter book: playback started directly
    Playing { book: usize },
    /// The chapter list for the book should be shown
    ShowChapters { book: usize, chapters: usize },
}

/// Engine state as last reported on the event stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedPlayback {
    pub state: MediaState,
    pub file_index: usize,
    pub title: Option<String>,
    pub last_error: Option<String>,
}

pub struct Coordinator {
    host: Arc<EngineHost>,
    channel: CommandChannel,
    catalog: Arc<Catalog>,
    events: Receiver<EngineEvent>,
    observed: ObservedPlayback,
    affordance: PlayAffordance,
    focused_section: usize,
    focused_book: Option<usize>,
}

impl Coordinator {
    pub fn new(host: Arc<EngineHost>) -> Self {
        let events = host.subscribe();
        let channel = host.channel().clone();
        let catalog = Arc::clone(host.catalog());
        Self {
            host,
            channel,
            catalog,
            events,
            observed: ObservedPlayback::default(),
            affordance: PlayAffordance::default(),
            focused_section: 0,
            focused_book: None,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn affordance(&self) -> PlayAffordance {
        self.affordance
    }

    pub fn observed(&self) -> &ObservedPlayback {
        &self.observed
    }

    pub fn focused_section(&self) -> usize {
        self.focused_section
    }

    pub fn focused_book(&self) -> Option<usize> {
        self.focused_book
    }

    /// Tells a running engine the foreground is up
    pub fn announce(&self) -> Delivery {
        self.channel.send(CommandMessage::single(keys::START, "0"))
    }

    pub fn focus_section(&mut self, section: usize) -> CoordinatorResult<()> {
        let count = self.catalog.sections().len();
        if section >= count {
            return Err(CoordinatorError::UnknownSection { section, count });
        }
        self.focused_section = section;
        self.focused_book = None;
        Ok(())
    }

    pub fn focus_book(&mut self, book: usize) -> CoordinatorResult<()> {
        let (section, _) = self.catalog.section_of(book)?;
        self.focused_section = section;
        self.focused_book = Some(book);
        Ok(())
    }

    /// Opens a book from the list
    ///
    /// A single-chapter book is itself the track and starts playing; any other
    /// book asks for its chapter list.
    pub fn open_book(&mut self, book: usize) -> CoordinatorResult<BookSelection> {
        let chapters = self.catalog.chapter_count(book)?;
        self.focus_book(book)?;
        if chapters == 1 {
            self.select_chapter(book, 0)?;
            Ok(BookSelection::Playing { book })
        } else {
            Ok(BookSelection::ShowChapters { book, chapters })
        }
    }

    /// Plays a chapter picked from the chapter list
    pub fn select_chapter(&mut self, book: usize, chapter: usize) -> CoordinatorResult<()> {
        self.ensure_engine()?;
        self.host.play_file(book, chapter)?;
        self.affordance = PlayAffordance::Pause;
        Ok(())
    }

    /// The toggle was pressed while offering Play
    ///
    /// The engine resumes when a track is paused; otherwise it starts the
    /// focused book, or the first book of the focused section, from its first
    /// chapter. The choice is made on the engine thread against the live
    /// session.
    pub fn play(&mut self) -> CoordinatorResult<()> {
        self.ensure_engine()?;
        self.host.play_or_start(self.play_target())?;
        self.affordance = PlayAffordance::Pause;
        Ok(())
    }

    pub fn pause(&mut self) -> CoordinatorResult<()> {
        self.host.pause()?;
        self.affordance = PlayAffordance::Play;
        Ok(())
    }

    /// Presses whichever action the toggle currently offers
    pub fn toggle(&mut self) -> CoordinatorResult<()> {
        match self.affordance {
            PlayAffordance::Play => self.play(),
            PlayAffordance::Pause => self.pause(),
        }
    }

    pub fn next(&self) -> Delivery {
        self.channel.send(CommandMessage::single(keys::NEXT, "0"))
    }

    pub fn previous(&self) -> Delivery {
        self.channel.send(CommandMessage::single(keys::PREVIOUS, "0"))
    }

    /// Loads `file_index` without playing it
    pub fn cue(&self, file_index: usize) -> Delivery {
        self.channel.send(
            CommandMessage::new()
                .with(keys::CURRENT_FILE_INDEX, file_index)
                .with(keys::RELOAD, "0"),
        )
    }

    /// Applies every pending engine event and returns them
    pub fn poll_events(&mut self) -> Vec<EngineEvent> {
        let pending: Vec<EngineEvent> = self.events.try_iter().collect();
        for event in &pending {
            self.apply_event(event);
        }
        pending
    }

    pub fn apply_event(&mut self, event: &EngineEvent) {
        match event {
            EngineEvent::Started => {
                self.observed = ObservedPlayback::default();
                self.affordance = PlayAffordance::Play;
            }
            EngineEvent::StateChanged { state, file_index } => {
                self.observed.state = *state;
                self.observed.file_index = *file_index;
                self.affordance = PlayAffordance::for_state(*state);
            }
            EngineEvent::TrackChanged {
                file_index, title, ..
            } => {
                self.observed.file_index = *file_index;
                self.observed.title = Some(title.clone());
            }
            EngineEvent::Error { message, .. } => {
                self.observed.last_error = Some(message.clone());
                self.observed.state = MediaState::Closed;
                self.affordance = PlayAffordance::Play;
            }
            EngineEvent::Stopped { .. } => {
                self.observed.state = MediaState::Closed;
                self.affordance = PlayAffordance::Play;
            }
        }
    }

    fn play_target(&self) -> usize {
        self.focused_book
            .or_else(|| self.catalog.section_first_book(self.focused_section))
            .unwrap_or(0)
    }

    /// Starts the engine if none is running; true if it had to
    fn ensure_engine(&self) -> CoordinatorResult<bool> {
        let started = self.host.start()?;
        if started {
            log::info!("Started playback engine from the foreground");
        }
        Ok(started)
    }
}
