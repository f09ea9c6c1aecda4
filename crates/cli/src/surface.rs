// FILE: crates/cli/src/surface.rs

use console::style;
use lectern_transport::{PlaybackStatus, TransportButton, TransportDisplay, TransportSurface};

/// Prints every transport display change, standing in for an OS media overlay
pub struct ConsoleSurface;

impl TransportSurface for ConsoleSurface {
    fn update(&mut self, display: &TransportDisplay) {
        println!("{}", style(render_display(display)).magenta());
    }
}

/// One-line rendering, e.g. `[transport] Playing: Genesis Chapter 1 (play pause next prev)`
pub fn render_display(display: &TransportDisplay) -> String {
    let status = match display.playback_status {
        PlaybackStatus::Closed => "Closed",
        PlaybackStatus::Stopped => "Stopped",
        PlaybackStatus::Playing => "Playing",
        PlaybackStatus::Paused => "Paused",
    };

    let buttons: Vec<&str> = [
        (TransportButton::Play, "play"),
        (TransportButton::Pause, "pause"),
        (TransportButton::Next, "next"),
        (TransportButton::Previous, "prev"),
    ]
    .iter()
    .filter(|(button, _)| display.is_enabled(*button))
    .map(|(_, label)| *label)
    .collect();

    let mut line = format!("[transport] {}", status);
    if let Some(title) = &display.display_title {
        line.push_str(": ");
        line.push_str(title);
    }
    if buttons.is_empty() {
        line.push_str(" (buttons disabled)");
    } else {
        line.push_str(&format!(" ({})", buttons.join(" ")));
    }
    line
}
