//! Locating and loading the Lectern config

use crate::persistence::ConfigFile;
use crate::{Config, ConfigError, ConfigResult, EnvOverrides};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

const FILE_NAME: &str = "config.toml";

/// Owns the location of `config.toml` and the load order
/// defaults < file < `LECTERN_*` environment variables
pub struct ConfigManager {
    file: ConfigFile,
}

impl ConfigManager {
    /// Uses the per-user config directory, e.g. `~/.config/lectern/` on Linux
    pub fn new() -> ConfigResult<Self> {
        let dirs = ProjectDirs::from("", "", "lectern").ok_or(ConfigError::NoConfigDir)?;
        Ok(Self::with_directory(dirs.config_dir().to_path_buf()))
    }

    /// Uses `config_dir` instead, as `--config-dir` does
    pub fn with_directory(config_dir: PathBuf) -> Self {
        Self {
            file: ConfigFile::new(config_dir.join(FILE_NAME)),
        }
    }

    pub fn config_path(&self) -> &Path {
        self.file.path()
    }

    /// The file alone, without environment overrides
    pub fn load(&self) -> ConfigResult<Config> {
        self.file.read()
    }

    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.file.write(config)
    }

    /// Writes the defaults unless a file is already there.
    ///
    /// Returns whether a file was created.
    pub fn initialize(&self) -> ConfigResult<bool> {
        if self.file.exists() {
            log::info!("{} already exists", self.config_path().display());
            return Ok(false);
        }
        self.save(&Config::default())?;
        Ok(true)
    }

    /// The effective config: the file, then `LECTERN_<SECTION>_<FIELD>` variables
    pub fn load_with_env_overrides(&self) -> ConfigResult<Config> {
        self.load_with(&|key| std::env::var(key).ok())
    }

    fn load_with(&self, lookup: &dyn Fn(&str) -> Option<String>) -> ConfigResult<Config> {
        let mut config = self.load()?;
        config.apply_env(&EnvOverrides::new(lookup));

        if let Err(errors) = config.validate() {
            for error in errors {
                log::warn!("After environment overrides: {}", error);
            }
        }
        Ok(config)
    }
}
