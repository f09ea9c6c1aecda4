//! End-to-end behavior of the engine host: triggers, channel messages,
//! cancellation and the transport surface

use crossbeam_channel::{bounded, Receiver, Sender};
use lectern_command_channel::{keys, CommandChannel, CommandMessage, Delivery, DropReason};
use lectern_core::{BookEntry, Catalog, MediaState};
use lectern_media_engine::{
    EngineConfig, EngineError, EngineEvent, EngineHost, MediaEventSink, MediaOutput, OutputCall,
    OutputResult, SimulatedOutput,
};
use lectern_resilience::Timeout;
use lectern_transport::{
    ButtonOutcome, MemorySurface, PlaybackStatus, TransportButton, TransportControlAdapter,
    TransportError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn catalog() -> Arc<Catalog> {
    Arc::new(
        Catalog::from_books(vec![
            BookEntry::new("Ruth", 2),
            BookEntry::new("Jude", 1),
            BookEntry::new("Jonah", 3),
        ])
        .expect("valid catalog"),
    )
}

fn simulated_host(output: &SimulatedOutput) -> EngineHost {
    let output = output.clone();
    EngineHost::new(
        catalog(),
        CommandChannel::new(16),
        EngineConfig::default(),
        move || -> Box<dyn MediaOutput> { Box::new(output.clone()) },
    )
}

fn wait_for(events: &Receiver<EngineEvent>, wanted: impl Fn(&EngineEvent) -> bool) -> EngineEvent {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match events.recv_timeout(remaining) {
            Ok(event) if wanted(&event) => return event,
            Ok(_) => continue,
            Err(_) => panic!("timed out waiting for engine event"),
        }
    }
}

fn playing(file_index: usize) -> impl Fn(&EngineEvent) -> bool {
    move |e| {
        *e == EngineEvent::StateChanged {
            state: MediaState::Playing,
            file_index,
        }
    }
}

fn is_started(e: &EngineEvent) -> bool {
    *e == EngineEvent::Started
}

#[test]
fn test_play_while_paused_does_not_reopen() {
    let output = SimulatedOutput::new();
    let host = simulated_host(&output);
    let events = host.subscribe();
    host.start().unwrap();

    host.play().unwrap();
    wait_for(&events, playing(0));
    host.pause().unwrap();
    wait_for(&events, |e| {
        matches!(e, EngineEvent::StateChanged { state: MediaState::Paused, .. })
    });

    output.clear_calls();
    host.play().unwrap();
    wait_for(&events, playing(0));
    assert_eq!(output.calls(), vec![OutputCall::Play]);
}

#[test]
fn test_play_while_closed_opens() {
    let output = SimulatedOutput::new();
    let host = simulated_host(&output);
    let events = host.subscribe();
    host.start().unwrap();

    host.play().unwrap();
    wait_for(&events, playing(0));
    assert_eq!(
        output.opened_uris(),
        vec!["file:///usr/share/lectern/audio/01_001.mp3".to_string()]
    );
}

#[test]
fn test_media_end_advances_exactly_once() {
    let output = SimulatedOutput::new();
    let host = simulated_host(&output);
    let events = host.subscribe();
    host.start().unwrap();

    host.play_file(0, 1).unwrap();
    wait_for(&events, playing(1));
    assert!(output.finish_track());

    wait_for(&events, playing(2));
    thread::sleep(Duration::from_millis(100));
    assert_eq!(output.open_count(), 2);
    assert_eq!(host.status().file_index, 2);
    assert_eq!(host.status().title.as_deref(), Some("Jude"));
}

#[test]
fn test_next_and_previous_wrap_around() {
    let output = SimulatedOutput::new();
    let host = simulated_host(&output);
    let events = host.subscribe();
    host.start().unwrap();

    host.previous().unwrap();
    wait_for(&events, playing(5));
    host.next().unwrap();
    wait_for(&events, playing(0));
}

#[test]
fn test_concurrent_next_never_reads_stale_index() {
    const PER_SOURCE: usize = 5;

    let output = SimulatedOutput::new();
    let host = {
        let output = output.clone();
        Arc::new(EngineHost::new(
            catalog(),
            CommandChannel::new(32),
            EngineConfig {
                trigger_queue_capacity: 256,
                event_queue_capacity: 256,
                ..EngineConfig::default()
            },
            move || -> Box<dyn MediaOutput> { Box::new(output.clone()) },
        ))
    };
    let events = host.subscribe();
    host.start().unwrap();
    wait_for(&events, is_started);

    let mut senders = Vec::new();
    for _ in 0..PER_SOURCE {
        let direct = Arc::clone(&host);
        senders.push(thread::spawn(move || direct.next().is_ok()));
        let channel = host.channel().clone();
        senders.push(thread::spawn(move || {
            channel
                .send(CommandMessage::single(keys::NEXT, "0"))
                .is_delivered()
        }));
    }

    let mut track_changes = Vec::new();
    while track_changes.len() < 2 * PER_SOURCE {
        if let EngineEvent::TrackChanged { file_index, .. } =
            wait_for(&events, |e| matches!(e, EngineEvent::TrackChanged { .. }))
        {
            track_changes.push(file_index);
        }
    }
    for sender in senders {
        assert!(sender.join().unwrap());
    }

    let total = catalog().total_tracks();
    let expected: Vec<usize> = (1..=2 * PER_SOURCE).map(|n| n % total).collect();
    assert_eq!(track_changes, expected);
    assert_eq!(output.open_count(), 2 * PER_SOURCE);
    assert_eq!(host.status().file_index, (2 * PER_SOURCE) % total);
}

#[test]
fn test_channel_index_and_reload() {
    let output = SimulatedOutput::new();
    let host = simulated_host(&output);
    let events = host.subscribe();
    host.start().unwrap();
    wait_for(&events, is_started);

    let reload_four = CommandMessage::from_json(r#"{"CURRENTFILEINDEX":4,"RELOAD":"0"}"#).unwrap();
    assert!(host.channel().send(reload_four).is_delivered());
    wait_for(&events, |e| matches!(e, EngineEvent::TrackChanged { file_index: 4, .. }));

    let garbage = CommandMessage::new()
        .with(keys::CURRENT_FILE_INDEX, "four")
        .with(keys::RELOAD, "0");
    assert!(host.channel().send(garbage).is_delivered());
    wait_for(&events, |e| matches!(e, EngineEvent::TrackChanged { file_index: 0, .. }));
    wait_for(&events, |e| {
        *e == EngineEvent::StateChanged {
            state: MediaState::Paused,
            file_index: 0,
        }
    });

    assert_eq!(output.open_count(), 2);
    assert!(!output.calls().contains(&OutputCall::Play));
}

#[test]
fn test_out_of_range_index_clamps_to_zero() {
    let output = SimulatedOutput::new();
    let host = simulated_host(&output);
    let events = host.subscribe();
    host.start().unwrap();

    host.channel()
        .send(CommandMessage::single(keys::CURRENT_FILE_INDEX, 3i64));
    host.channel()
        .send(CommandMessage::single(keys::CURRENT_FILE_INDEX, 600i64));
    host.play().unwrap();
    wait_for(&events, playing(0));
}

#[test]
fn test_open_failure_is_reported_not_fatal() {
    let output = SimulatedOutput::new();
    let host = simulated_host(&output);
    let events = host.subscribe();
    host.start().unwrap();

    output.fail_next_open("device busy");
    host.play().unwrap();
    let error = wait_for(&events, |e| matches!(e, EngineEvent::Error { .. }));
    match error {
        EngineEvent::Error { file_index, message } => {
            assert_eq!(file_index, 0);
            assert!(message.contains("device busy"));
        }
        other => panic!("unexpected event {:?}", other),
    }

    let status = host.status();
    assert!(status.running);
    assert_eq!(status.state, MediaState::Closed);
    assert!(status.last_error.is_some());

    host.play().unwrap();
    wait_for(&events, playing(0));
}

#[test]
fn test_message_before_start_is_lost() {
    let output = SimulatedOutput::new();
    let host = simulated_host(&output);

    let delivery = host
        .channel()
        .send(CommandMessage::single(keys::CURRENT_FILE_INDEX, 4i64));
    assert_eq!(delivery, Delivery::Dropped(DropReason::NoReceiver));
    assert!(matches!(host.play(), Err(EngineError::NotRunning)));

    let events = host.subscribe();
    host.start().unwrap();
    host.play().unwrap();
    wait_for(&events, playing(0));
    assert_eq!(host.channel().stats().dropped, 1);
}

#[test]
fn test_restart_begins_at_track_zero() {
    let output = SimulatedOutput::new();
    let host = simulated_host(&output);
    let events = host.subscribe();

    host.start().unwrap();
    host.play_file(2, 1).unwrap();
    wait_for(&events, playing(4));

    assert!(host.cancel());
    wait_for(&events, |e| matches!(e, EngineEvent::Stopped { .. }));
    assert!(!host.is_running());

    assert!(host.start().unwrap());
    wait_for(&events, is_started);
    assert_eq!(host.status().file_index, 0);

    host.play().unwrap();
    wait_for(&events, playing(0));
}

#[test]
fn test_start_twice_keeps_running_engine() {
    let output = SimulatedOutput::new();
    let host = simulated_host(&output);
    assert!(host.start().unwrap());
    assert!(!host.start().unwrap());
}

/// An output whose `open` blocks until released
struct GatedOutput {
    gate: Receiver<()>,
    entered: Sender<()>,
    state: MediaState,
}

impl MediaOutput for GatedOutput {
    fn open(&mut self, _uri: &str, _events: MediaEventSink) -> OutputResult<()> {
        let _ = self.entered.send(());
        let _ = self.gate.recv_timeout(Duration::from_secs(5));
        self.state = MediaState::Paused;
        Ok(())
    }

    fn play(&mut self) -> OutputResult<()> {
        self.state = MediaState::Playing;
        Ok(())
    }

    fn pause(&mut self) -> OutputResult<()> {
        self.state = MediaState::Paused;
        Ok(())
    }

    fn close(&mut self) {
        self.state = MediaState::Closed;
    }

    fn state(&self) -> MediaState {
        self.state
    }
}

#[test]
fn test_cancel_rejects_pending_triggers() {
    let (release, gate) = bounded::<()>(1);
    let (entered_tx, entered) = bounded::<()>(1);
    let host = Arc::new(EngineHost::new(
        catalog(),
        CommandChannel::new(16),
        EngineConfig::default(),
        move || -> Box<dyn MediaOutput> {
            Box::new(GatedOutput {
                gate: gate.clone(),
                entered: entered_tx.clone(),
                state: MediaState::Closed,
            })
        },
    ));
    let events = host.subscribe();
    host.start().unwrap();

    host.play().unwrap();
    entered.recv_timeout(Duration::from_secs(2)).unwrap();

    // Queued behind the blocked open
    host.next().unwrap();
    host.next().unwrap();
    assert!(host
        .channel()
        .send(CommandMessage::single(keys::NEXT, "0"))
        .is_delivered());

    let canceller = {
        let host = Arc::clone(&host);
        thread::spawn(move || host.cancel())
    };
    thread::sleep(Duration::from_millis(100));
    assert!(matches!(host.play(), Err(EngineError::NotRunning)));

    release.send(()).unwrap();
    assert!(canceller.join().unwrap());

    assert_eq!(
        wait_for(&events, |e| matches!(e, EngineEvent::Stopped { .. })),
        EngineEvent::Stopped { rejected: 3 }
    );
    assert_eq!(host.status().rejected_triggers, 3);
    assert!(!host.barrier().is_raised());
    assert_eq!(
        host.channel().send(CommandMessage::single(keys::NEXT, "0")),
        Delivery::Dropped(DropReason::NoReceiver)
    );
}

/// An output whose `close` blocks until released
struct SlowCloseOutput {
    gate: Receiver<()>,
    entered: Sender<()>,
    state: MediaState,
}

impl MediaOutput for SlowCloseOutput {
    fn open(&mut self, _uri: &str, _events: MediaEventSink) -> OutputResult<()> {
        self.state = MediaState::Paused;
        Ok(())
    }

    fn play(&mut self) -> OutputResult<()> {
        self.state = MediaState::Playing;
        Ok(())
    }

    fn pause(&mut self) -> OutputResult<()> {
        self.state = MediaState::Paused;
        Ok(())
    }

    fn close(&mut self) {
        let _ = self.entered.send(());
        let _ = self.gate.recv_timeout(Duration::from_secs(5));
        self.state = MediaState::Closed;
    }

    fn state(&self) -> MediaState {
        self.state
    }
}

#[test]
fn test_start_during_cancel_keeps_new_engine_attached() {
    let (release, gate) = bounded::<()>(1);
    let (entered_tx, entered) = bounded::<()>(4);
    let built = Arc::new(AtomicUsize::new(0));
    let output = SimulatedOutput::new();
    let host = {
        let output = output.clone();
        Arc::new(EngineHost::new(
            catalog(),
            CommandChannel::new(16),
            EngineConfig::default(),
            move || -> Box<dyn MediaOutput> {
                if built.fetch_add(1, Ordering::SeqCst) == 0 {
                    Box::new(SlowCloseOutput {
                        gate: gate.clone(),
                        entered: entered_tx.clone(),
                        state: MediaState::Closed,
                    })
                } else {
                    Box::new(output.clone())
                }
            },
        ))
    };
    let events = host.subscribe();
    host.start().unwrap();
    host.play().unwrap();
    wait_for(&events, playing(0));

    let canceller = {
        let host = Arc::clone(&host);
        thread::spawn(move || host.cancel())
    };
    entered.recv_timeout(Duration::from_secs(2)).unwrap();

    let starter = {
        let host = Arc::clone(&host);
        thread::spawn(move || host.start())
    };
    thread::sleep(Duration::from_millis(100));
    assert!(!starter.is_finished());
    assert!(matches!(host.next(), Err(EngineError::NotRunning)));

    release.send(()).unwrap();
    assert!(canceller.join().unwrap());
    assert!(starter.join().unwrap().unwrap());

    wait_for(&events, |e| matches!(e, EngineEvent::Stopped { .. }));
    wait_for(&events, is_started);
    assert!(host.is_running());
    assert!(host.channel().is_attached());
    assert!(host.barrier().is_raised());
    assert!(host.status().running);

    assert!(host
        .channel()
        .send(CommandMessage::single(keys::NEXT, "0"))
        .is_delivered());
    wait_for(&events, playing(1));
    assert_eq!(output.open_count(), 1);
}

fn host_with_surface(timeout_ms: u64) -> (Arc<EngineHost>, TransportControlAdapter, MemorySurface) {
    let catalog = catalog();
    let surface = MemorySurface::new();
    let adapter = TransportControlAdapter::new(
        surface.clone(),
        Arc::clone(&catalog),
        Timeout::from_millis(timeout_ms),
    );
    let output = SimulatedOutput::new();
    let host = EngineHost::new(
        catalog,
        CommandChannel::new(16),
        EngineConfig::default(),
        move || -> Box<dyn MediaOutput> { Box::new(output.clone()) },
    )
    .with_adapter(adapter.clone());
    (Arc::new(host), adapter, surface)
}

#[test]
fn test_hardware_play_waits_for_late_start() {
    let (host, adapter, surface) = host_with_surface(2000);
    let events = host.subscribe();

    let presser = {
        let host = Arc::clone(&host);
        let adapter = adapter.clone();
        thread::spawn(move || adapter.handle_button(TransportButton::Play, &*host))
    };
    thread::sleep(Duration::from_millis(500));
    host.start().unwrap();

    assert_eq!(
        presser.join().unwrap(),
        Ok(ButtonOutcome::DispatchedAfterStartup)
    );
    wait_for(&events, playing(0));

    let display = surface.latest().unwrap();
    assert!(display.is_play_enabled && display.is_next_enabled);
    assert_eq!(display.playback_status, PlaybackStatus::Playing);
    assert_eq!(display.display_title.as_deref(), Some("Ruth Chapter 1"));

    host.cancel();
    assert_eq!(adapter.display().playback_status, PlaybackStatus::Closed);
}

#[test]
fn test_hardware_play_times_out_without_engine() {
    let (host, adapter, _surface) = host_with_surface(300);

    let started = Instant::now();
    assert_eq!(
        adapter.handle_button(TransportButton::Play, &*host),
        Err(TransportError::StartupTimeout(Duration::from_millis(300)))
    );
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn test_shutdown_releases_waiting_play_press() {
    let (host, adapter, _surface) = host_with_surface(2000);

    let presser = {
        let host = Arc::clone(&host);
        let adapter = adapter.clone();
        thread::spawn(move || adapter.handle_button(TransportButton::Play, &*host))
    };
    thread::sleep(Duration::from_millis(100));
    let started = Instant::now();
    host.shutdown();

    assert_eq!(presser.join().unwrap(), Err(TransportError::StartupCancelled));
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(matches!(host.start(), Err(EngineError::HostClosed)));
}

#[test]
fn test_hardware_next_dropped_without_engine() {
    let (host, adapter, _surface) = host_with_surface(2000);
    for button in [TransportButton::Next, TransportButton::Previous, TransportButton::Pause] {
        assert_eq!(adapter.handle_button(button, &*host), Ok(ButtonOutcome::Dropped));
    }
}

#[test]
fn test_hardware_buttons_drive_running_engine() {
    let (host, adapter, surface) = host_with_surface(2000);
    let events = host.subscribe();
    host.start().unwrap();
    wait_for(&events, is_started);

    assert_eq!(
        adapter.handle_button(TransportButton::Next, &*host),
        Ok(ButtonOutcome::Dispatched)
    );
    wait_for(&events, playing(1));
    assert_eq!(
        adapter.handle_button(TransportButton::Pause, &*host),
        Ok(ButtonOutcome::Dispatched)
    );
    wait_for(&events, |e| {
        matches!(e, EngineEvent::StateChanged { state: MediaState::Paused, .. })
    });
    assert_eq!(surface.titles().last().map(String::as_str), Some("Ruth Chapter 2"));
}
