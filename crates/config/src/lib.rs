//! Lectern configuration
//!
//! `config.toml` has three tables, each a [`ConfigSection`]:
//!
//! - `[app]`: default log filter and the event-poll period of the CLI loop
//! - `[player]`: engine queue sizes, auto-advance and the startup wait of a
//!   hardware Play press
//! - `[catalog]`: base URI, file-name pattern and optional custom books
//!
//! Values that are out of range on load are logged, not fatal. Saving refuses
//! them. `LECTERN_<SECTION>_<FIELD>` variables override the file.
//!
//! ```rust,no_run
//! use lectern_config::{Config, ConfigManager};
//!
//! let config = ConfigManager::new()
//!     .and_then(|manager| manager.load_with_env_overrides())
//!     .unwrap_or_else(|e| {
//!         eprintln!("Config error: {}, using defaults", e);
//!         Config::default()
//!     });
//! println!("Play waits up to {:?} for the engine", config.player.startup_timeout());
//! ```

mod error;
mod manager;
mod persistence;
mod validation;

mod app_config;
mod catalog_config;
mod player_config;

pub use error::{ConfigError, ConfigResult, ValidationError};
pub use manager::ConfigManager;
pub use validation::{ConfigSection, EnvOverrides, Report};

pub use app_config::{AppConfig, LogLevel};
pub use catalog_config::{BookSpec, CatalogConfig, SectionSpec};
pub use player_config::PlayerConfig;

use serde::{Deserialize, Serialize};

/// Current config file format version
pub const CONFIG_VERSION: u32 = 1;

/// Contents of `config.toml`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub version: u32,
    pub app: AppConfig,
    pub player: PlayerConfig,
    pub catalog: CatalogConfig,
}

impl Config {
    /// Every violation across `[app]`, `[player]` and `[catalog]`
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        for result in [
            self.app.validate(),
            self.player.validate(),
            self.catalog.validate(),
        ] {
            if let Err(mut section) = result {
                errors.append(&mut section);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub(crate) fn apply_env(&mut self, env: &EnvOverrides<'_>) {
        self.app.apply_env(env);
        self.player.apply_env(env);
        self.catalog.apply_env(env);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            app: AppConfig::default(),
            player: PlayerConfig::default(),
            catalog: CatalogConfig::default(),
        }
    }
}
