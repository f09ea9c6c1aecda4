// FILE: crates/cli/src/main.rs

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use lectern_config::{Config, ConfigManager};
use std::path::PathBuf;

mod commands;
mod player;
mod surface;

fn build_cli() -> Command {
    Command::new("lectern")
        .version(env!("CARGO_PKG_VERSION"))
        .author("DrTomLLC")
        .about("Chapter-by-chapter audio book player with a background playback engine")
        .arg(
            Arg::new("config-dir")
                .short('c')
                .long("config-dir")
                .value_name("DIR")
                .help("Directory holding lectern.toml (default: platform config dir)")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true),
        )
        .subcommand(
            Command::new("catalog")
                .about("List books and their chapter counts")
                .arg(
                    Arg::new("section")
                        .short('s')
                        .long("section")
                        .value_name("N")
                        .help("Only list books of section N (1-based)")
                        .value_parser(clap::value_parser!(usize)),
                ),
        )
        .subcommand(
            Command::new("locate")
                .about("Show the file index and URI of a chapter")
                .arg(Arg::new("book").required(true).value_name("BOOK").help("Book number (1-based) or name"))
                .arg(Arg::new("chapter").required(true).value_name("CHAPTER").help("Chapter number (1-based)")),
        )
        .subcommand(
            Command::new("config")
                .about("Manage the configuration file")
                .subcommand_required(true)
                .subcommand(Command::new("init").about("Write a default config file if none exists"))
                .subcommand(Command::new("show").about("Print the effective configuration"))
                .subcommand(Command::new("path").about("Print the config file location")),
        )
        .subcommand(Command::new("run").about("Start an interactive playback session (default)"))
}

fn config_manager(matches: &ArgMatches) -> Result<ConfigManager> {
    match matches.get_one::<PathBuf>("config-dir") {
        Some(dir) => Ok(ConfigManager::with_directory(dir.clone())),
        None => ConfigManager::new().context("Failed to locate config directory"),
    }
}

fn load_config(manager: &ConfigManager) -> Config {
    manager.load_with_env_overrides().unwrap_or_else(|e| {
        eprintln!("Config error: {}, using defaults", e);
        Config::default()
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();
    let manager = config_manager(&matches)?;
    let config = load_config(&manager);

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.app.log_level.to_string()),
    )
    .init();
    log::debug!("Using config at {}", manager.config_path().display());

    match matches.subcommand() {
        Some(("config", sub_matches)) => commands::config_command(&manager, &config, sub_matches),
        Some(("catalog", sub_matches)) => {
            let catalog = commands::build_catalog(&config.catalog)?;
            commands::list_catalog(&catalog, sub_matches)
        }
        Some(("locate", sub_matches)) => {
            let catalog = commands::build_catalog(&config.catalog)?;
            commands::locate(&catalog, sub_matches)
        }
        Some(("run", _)) | None => {
            let catalog = commands::build_catalog(&config.catalog)?;
            player::run_session(&config, catalog).await
        }
        Some((other, _)) => {
            build_cli().print_help()?;
            anyhow::bail!("Unknown command '{}'", other)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_locate_arguments() {
        let matches = build_cli()
            .try_get_matches_from(["lectern", "locate", "jude", "1"])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "locate");
        assert_eq!(sub.get_one::<String>("book").unwrap(), "jude");
    }

    #[test]
    fn test_global_config_dir() {
        let matches = build_cli()
            .try_get_matches_from(["lectern", "catalog", "--config-dir", "/tmp/lectern", "-s", "2"])
            .unwrap();
        assert_eq!(
            matches.get_one::<PathBuf>("config-dir"),
            Some(&PathBuf::from("/tmp/lectern"))
        );
        let (_, sub) = matches.subcommand().unwrap();
        assert_eq!(sub.get_one::<usize>("section"), Some(&2));
    }
}
