//! `[player]`: engine queues, auto-advance and the hardware startup wait

use crate::validation::{ConfigSection, EnvOverrides, Report};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    /// How long a hardware Play press waits for the engine to start, in milliseconds
    pub startup_timeout_ms: u64,

    /// Capacity of the engine's trigger queue
    pub command_queue_capacity: usize,

    /// Capacity of each engine event subscription
    pub event_queue_capacity: usize,

    /// Advance to the next track when the current one ends
    pub auto_advance: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            startup_timeout_ms: 2000,
            command_queue_capacity: 32,
            event_queue_capacity: 64,
            auto_advance: true,
        }
    }
}

impl PlayerConfig {
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }
}

impl ConfigSection for PlayerConfig {
    const NAME: &'static str = "player";

    fn check(&self, report: &mut Report) {
        report.range("startup_timeout_ms", self.startup_timeout_ms, 100, 30_000);
        report.range("command_queue_capacity", self.command_queue_capacity, 1, 1024);
        report.range("event_queue_capacity", self.event_queue_capacity, 1, 4096);
    }

    fn apply_env(&mut self, env: &EnvOverrides<'_>) {
        env.set(Self::NAME, "startup_timeout_ms", &mut self.startup_timeout_ms);
        env.set(Self::NAME, "command_queue_capacity", &mut self.command_queue_capacity);
        env.set(Self::NAME, "event_queue_capacity", &mut self.event_queue_capacity);
        env.set(Self::NAME, "auto_advance", &mut self.auto_advance);
    }
}
