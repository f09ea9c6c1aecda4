// FILE: crates/cli/src/player.rs

//! Interactive playback session
//!
//! Plays the foreground role: user commands go through the coordinator,
//! `button` presses go through the transport adapter on a blocking task, and
//! engine events are drained on a ticker. Audio output is simulated; `end`
//! and `fail` drive it by hand.

use crate::commands::{resolve_book, resolve_chapter};
use crate::surface::ConsoleSurface;
use anyhow::{anyhow, bail, Context, Result};
use console::style;
use lectern_command_channel::{CommandChannel, CommandMessage, Delivery};
use lectern_config::{Config, PlayerConfig};
use lectern_coordinator::{BookSelection, Coordinator};
use lectern_core::Catalog;
use lectern_media_engine::{EngineConfig, EngineEvent, EngineHost, MediaOutput, SimulatedOutput};
use lectern_resilience::Timeout;
use lectern_transport::{TransportButton, TransportControlAdapter};
use std::io::BufRead;
use std::sync::Arc;
use std::thread;
use tokio::sync::mpsc;
use tokio::time::interval;

const HELP: &str = "\
Commands:
  books                     list books
  section <n>               focus a section for 'play'
  open <book>               open a book (single-chapter books start playing)
  select <book> [chapter]   play a chapter (default 1)
  play | pause | toggle     the play/pause affordance
  next | prev               send NEXT / PREVIOUS over the command channel
  cue <index>               load a track by file index without playing
  button <play|pause|next|prev>
                            press a hardware transport button
  end                       finish the playing track
  fail                      make the next open fail
  send <json>               send a raw command message, e.g. {\"NEXT\":\"0\"}
  kill | start              cancel or start the playback engine
  status                    show engine status
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Books,
    Section(usize),
    Open(String),
    Select { book: String, chapter: Option<String> },
    Play,
    Pause,
    Toggle,
    Next,
    Previous,
    Cue(usize),
    Button(TransportButton),
    End,
    Fail,
    Send(String),
    Kill,
    Start,
    Status,
    Help,
    Quit,
}

impl SessionCommand {
    /// Parses one input line; blank lines yield `None`
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "books" | "ls" => Self::Books,
            "section" => Self::Section(
                rest.parse()
                    .with_context(|| format!("'{}' is not a section number", rest))?,
            ),
            "open" => Self::Open(required(rest, "open <book>")?),
            "select" => {
                let rest = required(rest, "select <book> [chapter]")?;
                // The last word is the chapter when it is a number: "select 1 john 3"
                match rest.rsplit_once(char::is_whitespace) {
                    Some((book, chapter)) if chapter.parse::<usize>().is_ok() => Self::Select {
                        book: book.trim().to_string(),
                        chapter: Some(chapter.to_string()),
                    },
                    _ => Self::Select {
                        book: rest,
                        chapter: None,
                    },
                }
            }
            "play" => Self::Play,
            "pause" => Self::Pause,
            "toggle" => Self::Toggle,
            "next" => Self::Next,
            "prev" | "previous" => Self::Previous,
            "cue" => Self::Cue(
                rest.parse()
                    .with_context(|| format!("'{}' is not a file index", rest))?,
            ),
            "button" => Self::Button(rest.parse().map_err(|e: String| anyhow!(e))?),
            "end" => Self::End,
            "fail" => Self::Fail,
            "send" => Self::Send(required(rest, "send <json>")?),
            "kill" => Self::Kill,
            "start" => Self::Start,
            "status" => Self::Status,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => bail!("Unknown command '{}', try 'help'", other),
        };
        Ok(Some(command))
    }
}

fn required(rest: &str, usage: &str) -> Result<String> {
    if rest.is_empty() {
        bail!("Usage: {}", usage);
    }
    Ok(rest.to_string())
}

pub fn engine_config(player: &PlayerConfig) -> EngineConfig {
    EngineConfig {
        trigger_queue_capacity: player.command_queue_capacity,
        event_queue_capacity: player.event_queue_capacity,
        auto_advance: player.auto_advance,
    }
}

pub fn format_event(event: &EngineEvent) -> String {
    match event {
        EngineEvent::Started => "engine started".to_string(),
        EngineEvent::StateChanged { state, file_index } => {
            format!("state {} at #{}", state, file_index)
        }
        EngineEvent::TrackChanged {
            file_index, title, ..
        } => format!("now at #{}: {}", file_index, title),
        EngineEvent::Error {
            file_index,
            message,
        } => format!("playback error at #{}: {}", file_index, message),
        EngineEvent::Stopped { rejected } => {
            format!("engine stopped, {} pending triggers rejected", rejected)
        }
    }
}

fn report_delivery(what: &str, delivery: Delivery) {
    match delivery {
        Delivery::Delivered => log::debug!("{} delivered", what),
        Delivery::Dropped(reason) => println!(
            "{} {} was not delivered ({:?})",
            style("note:").yellow(),
            what,
            reason
        ),
    }
}

enum Flow {
    Continue,
    Quit,
}

struct Session {
    catalog: Arc<Catalog>,
    host: Arc<EngineHost>,
    adapter: TransportControlAdapter,
    coordinator: Coordinator,
    output: SimulatedOutput,
}

impl Session {
    fn new(config: &Config, catalog: Arc<Catalog>) -> Self {
        let output = SimulatedOutput::new();
        let adapter = TransportControlAdapter::new(
            ConsoleSurface,
            Arc::clone(&catalog),
            Timeout::new(config.player.startup_timeout()),
        );

        let factory_output = output.clone();
        let host = Arc::new(
            EngineHost::new(
                Arc::clone(&catalog),
                CommandChannel::new(config.player.command_queue_capacity),
                engine_config(&config.player),
                move || -> Box<dyn MediaOutput> { Box::new(factory_output.clone()) },
            )
            .with_adapter(adapter.clone()),
        );
        let coordinator = Coordinator::new(Arc::clone(&host));

        Self {
            catalog,
            host,
            adapter,
            coordinator,
            output,
        }
    }

    fn start_engine(&self) -> Result<()> {
        if !self.host.start().context("Failed to start playback engine")? {
            println!("Engine is already running");
        }
        report_delivery("START", self.coordinator.announce());
        Ok(())
    }

    fn drain_events(&mut self) {
        for event in self.coordinator.poll_events() {
            let line = format_event(&event);
            match event {
                EngineEvent::Error { .. } => println!("{}", style(line).red()),
                _ => println!("{}", style(line).dim()),
            }
        }
    }

    fn execute(&mut self, command: SessionCommand) -> Result<Flow> {
        match command {
            SessionCommand::Books => {
                for (index, book) in self.catalog.books().iter().enumerate() {
                    println!("  {:>3}  {} ({})", index + 1, book.name, book.chapters);
                }
            }
            SessionCommand::Section(number) => {
                let section = number
                    .checked_sub(1)
                    .ok_or_else(|| anyhow!("Sections are numbered from 1"))?;
                self.coordinator.focus_section(section)?;
                println!("Focused {}", self.catalog.sections()[section].name);
            }
            SessionCommand::Open(book) => {
                let book = resolve_book(&self.catalog, &book)?;
                match self.coordinator.open_book(book)? {
                    BookSelection::Playing { book } => {
                        println!("Playing {}", self.catalog.book_name(book)?)
                    }
                    BookSelection::ShowChapters { book, chapters } => println!(
                        "{} has {} chapters, use 'select {} <chapter>'",
                        self.catalog.book_name(book)?,
                        chapters,
                        book + 1
                    ),
                }
            }
            SessionCommand::Select { book, chapter } => {
                let book = resolve_book(&self.catalog, &book)?;
                let chapter = match chapter {
                    Some(chapter) => resolve_chapter(&self.catalog, book, &chapter)?,
                    None => 0,
                };
                self.coordinator.select_chapter(book, chapter)?;
            }
            SessionCommand::Play => self.coordinator.play()?,
            SessionCommand::Pause => self.coordinator.pause()?,
            SessionCommand::Toggle => self.coordinator.toggle()?,
            SessionCommand::Next => report_delivery("NEXT", self.coordinator.next()),
            SessionCommand::Previous => report_delivery("PREVIOUS", self.coordinator.previous()),
            SessionCommand::Cue(index) => report_delivery("CUE", self.coordinator.cue(index)),
            SessionCommand::Button(button) => self.press(button),
            SessionCommand::End => {
                if !self.output.finish_track() {
                    println!("Nothing is playing");
                }
            }
            SessionCommand::Fail => {
                self.output.fail_next_open("simulated failure");
                println!("The next open will fail");
            }
            SessionCommand::Send(json) => {
                let message = CommandMessage::from_json(&json).context("Invalid command message")?;
                let label = message.to_string();
                report_delivery(&label, self.host.channel().send(message));
            }
            SessionCommand::Kill => {
                if !self.host.cancel() {
                    println!("Engine is not running");
                }
            }
            SessionCommand::Start => self.start_engine()?,
            SessionCommand::Status => self.print_status()?,
            SessionCommand::Help => println!("{}", HELP),
            SessionCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Hardware buttons may wait on the startup barrier, so they run off the
    /// input loop
    fn press(&self, button: TransportButton) {
        let adapter = self.adapter.clone();
        let host = Arc::clone(&self.host);
        tokio::spawn(async move {
            let pressed =
                tokio::task::spawn_blocking(move || adapter.handle_button(button, &*host)).await;
            match pressed {
                Ok(Ok(outcome)) => println!("{}", style(format!("button {}: {:?}", button, outcome)).dim()),
                Ok(Err(e)) => println!("{} button {}: {}", style("warning:").yellow(), button, e),
                Err(e) => log::error!("Button task failed: {}", e),
            }
        });
    }

    fn print_status(&self) -> Result<()> {
        let status = self.host.status();
        println!(
            "{}",
            serde_json::to_string_pretty(&status).context("Failed to render status")?
        );
        let stats = self.host.channel().stats();
        println!(
            "toggle: {}  channel: {} delivered, {} dropped  barrier: {:?}",
            style(self.coordinator.affordance()).bold(),
            stats.delivered,
            stats.dropped,
            self.host.barrier().state()
        );
        Ok(())
    }

    fn shutdown(&mut self) {
        self.host.shutdown();
        self.drain_events();
    }
}

/// Runs the interactive session until `quit` or end of input
pub async fn run_session(config: &Config, catalog: Catalog) -> Result<()> {
    let mut session = Session::new(config, Arc::new(catalog));
    session.start_engine()?;
    println!("{}", style("Lectern interactive session, 'help' for commands").bold());

    let (line_tx, mut line_rx) = mpsc::channel::<String>(16);
    // A detached thread, so a pending read never holds up exit
    thread::Builder::new()
        .name("lectern-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if line_tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        log::warn!("Failed to read input: {}", e);
                        break;
                    }
                }
            }
        })
        .context("Failed to start input reader")?;

    let mut ticker = interval(config.app.event_poll_interval());
    loop {
        tokio::select! {
            line = line_rx.recv() => {
                let Some(line) = line else { break };
                let result = SessionCommand::parse(&line).and_then(|command| match command {
                    Some(command) => session.execute(command),
                    None => Ok(Flow::Continue),
                });
                match result {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Quit) => break,
                    Err(e) => println!("{} {:#}", style("error:").red(), e),
                }
            }
            _ = ticker.tick() => session.drain_events(),
        }
    }

    session.shutdown();
    Ok(())
}
