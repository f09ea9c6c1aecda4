//! `[app]`: logging and the foreground event loop

use crate::validation::{ConfigSection, EnvOverrides, Report, ValidationError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Default `env_logger` filter when `RUST_LOG` is unset
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(ValidationError::with_value(
                "app.log_level",
                "must be one of: error, warn, info, debug, trace",
                s,
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Default log filter when RUST_LOG is not set
    pub log_level: LogLevel,

    /// How often the foreground loop drains engine events, in milliseconds
    pub event_poll_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            event_poll_ms: 50,
        }
    }
}

impl AppConfig {
    /// Period of the foreground loop that drains engine events
    pub fn event_poll_interval(&self) -> Duration {
        Duration::from_millis(self.event_poll_ms)
    }
}

impl ConfigSection for AppConfig {
    const NAME: &'static str = "app";

    fn check(&self, report: &mut Report) {
        report.range("event_poll_ms", self.event_poll_ms, 10, 1000);
    }

    fn apply_env(&mut self, env: &EnvOverrides<'_>) {
        env.set(Self::NAME, "log_level", &mut self.log_level);
        env.set(Self::NAME, "event_poll_ms", &mut self.event_poll_ms);
    }
}
