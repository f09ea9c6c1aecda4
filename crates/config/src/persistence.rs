//! Reading and atomically replacing `config.toml`
//!
//! A save goes through a temp file in the same directory and a rename, so a
//! reader never sees a half-written file. The file being replaced is copied to
//! `config.toml.backup` first.

use crate::{Config, ConfigError, ConfigResult, CONFIG_VERSION};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub(crate) struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn backup_path(&self) -> PathBuf {
        self.path.with_extension("toml.backup")
    }

    pub(crate) fn exists(&self) -> bool {
        self.path.exists()
    }

    /// A missing file reads as defaults; an empty or malformed one is an error.
    ///
    /// Out-of-range values are logged and kept so the user can see them in
    /// `config show`.
    pub(crate) fn read(&self) -> ConfigResult<Config> {
        if !self.exists() {
            log::info!("No config at {}, using defaults", self.path.display());
            return Ok(Config::default());
        }

        let text = fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })?;
        if text.trim().is_empty() {
            return Err(ConfigError::Empty {
                path: self.path.clone(),
            });
        }

        let mut config: Config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })?;

        if config.version != CONFIG_VERSION {
            log::warn!(
                "{} declares version {}, reading it as version {}",
                self.path.display(),
                config.version,
                CONFIG_VERSION
            );
            config.version = CONFIG_VERSION;
        }

        if let Err(errors) = config.validate() {
            for error in errors {
                log::warn!("{}: {}", self.path.display(), error);
            }
        }

        Ok(config)
    }

    /// Refuses invalid configs, so a saved file always validates
    pub(crate) fn write(&self, config: &Config) -> ConfigResult<()> {
        config.validate().map_err(ConfigError::Invalid)?;
        let text = toml::to_string_pretty(config)?;

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|source| ConfigError::Write {
            path: dir.to_path_buf(),
            source,
        })?;

        if self.exists() {
            let backup = self.backup_path();
            fs::copy(&self.path, &backup).map_err(|source| ConfigError::Write {
                path: backup.clone(),
                source,
            })?;
            log::debug!("Kept previous config as {}", backup.display());
        }

        let staging_failed = |source| ConfigError::Write {
            path: dir.to_path_buf(),
            source,
        };
        let mut staged = NamedTempFile::new_in(dir).map_err(staging_failed)?;
        staged.write_all(text.as_bytes()).map_err(staging_failed)?;
        staged.flush().map_err(staging_failed)?;
        staged
            .persist(&self.path)
            .map_err(|e| ConfigError::Write {
                path: self.path.clone(),
                source: e.error,
            })?;

        log::info!("Wrote {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BookSpec;
    use tempfile::TempDir;

    fn config_file() -> (TempDir, ConfigFile) {
        let dir = TempDir::new().unwrap();
        let file = ConfigFile::new(dir.path().join("config.toml"));
        (dir, file)
    }

    #[test]
    fn test_missing_file_reads_as_defaults() {
        let (_dir, file) = config_file();
        assert_eq!(file.read().unwrap(), Config::default());
        assert!(!file.exists());
    }

    #[test]
    fn test_write_then_read() {
        let (_dir, file) = config_file();
        let mut config = Config::default();
        config.player.startup_timeout_ms = 850;
        config.catalog.books = vec![BookSpec {
            name: "Jonah".to_string(),
            chapters: 4,
        }];

        file.write(&config).unwrap();
        assert_eq!(file.read().unwrap(), config);
    }

    #[test]
    fn test_write_creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let file = ConfigFile::new(dir.path().join("a").join("b").join("config.toml"));

        file.write(&Config::default()).unwrap();
        assert!(file.exists());
    }

    #[test]
    fn test_backup_holds_replaced_file() {
        let (_dir, file) = config_file();
        let mut config = Config::default();
        config.app.event_poll_ms = 40;
        file.write(&config).unwrap();
        assert!(!file.backup_path().exists());

        config.app.event_poll_ms = 80;
        file.write(&config).unwrap();

        let backup: Config =
            toml::from_str(&fs::read_to_string(file.backup_path()).unwrap()).unwrap();
        assert_eq!(backup.app.event_poll_ms, 40);
        assert_eq!(file.read().unwrap().app.event_poll_ms, 80);
    }

    #[test]
    fn test_malformed_toml_is_a_parse_error() {
        let (_dir, file) = config_file();
        fs::write(file.path(), "this is not valid TOML {{{").unwrap();
        assert!(matches!(file.read(), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_blank_file_is_rejected() {
        let (_dir, file) = config_file();
        fs::write(file.path(), "   \n").unwrap();
        assert!(matches!(file.read(), Err(ConfigError::Empty { .. })));
    }

    #[test]
    fn test_invalid_config_is_not_written() {
        let (_dir, file) = config_file();
        let mut config = Config::default();
        config.player.command_queue_capacity = 0;

        match file.write(&config) {
            Err(ConfigError::Invalid(errors)) => {
                assert_eq!(errors[0].field, "player.command_queue_capacity");
            }
            other => panic!("expected Invalid, got {:?}", other),
        }
        assert!(!file.exists());
    }

    #[test]
    fn test_out_of_range_values_still_load() {
        let (_dir, file) = config_file();
        fs::write(file.path(), "[player]\nstartup_timeout_ms = 5\n").unwrap();

        let config = file.read().unwrap();
        assert_eq!(config.player.startup_timeout_ms, 5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_other_version_is_normalized() {
        let (_dir, file) = config_file();
        fs::write(file.path(), "version = 7\n").unwrap();
        assert_eq!(file.read().unwrap().version, CONFIG_VERSION);
    }
}
