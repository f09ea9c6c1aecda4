// FILE: crates/cli/src/commands.rs

use anyhow::{anyhow, bail, Context, Result};
use clap::ArgMatches;
use console::style;
use lectern_config::{CatalogConfig, Config, ConfigManager};
use lectern_core::{BookEntry, Catalog, MediaLocator, Section};

/// Builds the catalog described by the config: the built-in canon unless a
/// book list is given
pub fn build_catalog(config: &CatalogConfig) -> Result<Catalog> {
    let mut catalog = if config.uses_builtin_books() {
        Catalog::bible()
    } else {
        let books = config
            .books
            .iter()
            .map(|b| BookEntry::new(b.name.clone(), b.chapters))
            .collect();
        Catalog::from_books(books).context("Invalid book list in catalog config")?
    };

    if !config.sections.is_empty() {
        let sections = config
            .sections
            .iter()
            .map(|s| Section::new(s.name.clone(), s.first_book))
            .collect();
        catalog = catalog
            .with_sections(sections)
            .context("Invalid section table in catalog config")?;
    }

    Ok(catalog.with_locator(MediaLocator::new(
        config.base_uri.clone(),
        config.file_pattern.clone(),
    )))
}

/// Resolves a user-typed book: a 1-based number or a (prefix of a) name
pub fn resolve_book(catalog: &Catalog, input: &str) -> Result<usize> {
    let input = input.trim();
    if let Ok(number) = input.parse::<usize>() {
        if number == 0 || number > catalog.book_count() {
            bail!("Book number must be between 1 and {}", catalog.book_count());
        }
        return Ok(number - 1);
    }

    let wanted = input.to_lowercase();
    let books = catalog.books();
    books
        .iter()
        .position(|b| b.name.to_lowercase() == wanted)
        .or_else(|| books.iter().position(|b| b.name.to_lowercase().starts_with(&wanted)))
        .ok_or_else(|| anyhow!("No book named '{}'", input))
}

/// Converts a 1-based chapter number to an index
pub fn resolve_chapter(catalog: &Catalog, book: usize, input: &str) -> Result<usize> {
    let chapters = catalog.chapter_count(book)?;
    let number: usize = input
        .trim()
        .parse()
        .with_context(|| format!("'{}' is not a chapter number", input))?;
    if number == 0 || number > chapters {
        bail!(
            "{} has chapters 1 to {}",
            catalog.book_name(book)?,
            chapters
        );
    }
    Ok(number - 1)
}

/// List books, optionally only those of one section
pub fn list_catalog(catalog: &Catalog, matches: &ArgMatches) -> Result<()> {
    let section = matches
        .get_one::<usize>("section")
        .map(|n| {
            let count = catalog.sections().len();
            if *n == 0 || *n > count {
                Err(anyhow!("Section must be between 1 and {}", count))
            } else {
                Ok(n - 1)
            }
        })
        .transpose()?;

    println!(
        "\n{} books, {} tracks",
        style(catalog.book_count()).bold().cyan(),
        style(catalog.total_tracks()).bold().cyan()
    );

    for (index, book) in catalog.books().iter().enumerate() {
        let (book_section, info) = catalog.section_of(index)?;
        if section.is_some_and(|s| s != book_section) {
            continue;
        }
        if info.first_book == index {
            println!("\n{}", style(&info.name).bold().underlined());
        }
        let first_track = catalog.file_index(index, 0)?;
        println!(
            "  {:>3}  {:<20} {:>3} ch  {}",
            index + 1,
            book.name,
            book.chapters,
            style(format!("#{}", first_track)).dim()
        );
    }
    Ok(())
}

/// Show where a chapter sits in the track sequence
pub fn locate(catalog: &Catalog, matches: &ArgMatches) -> Result<()> {
    let book_arg = matches
        .get_one::<String>("book")
        .ok_or_else(|| anyhow!("Book is required"))?;
    let chapter_arg = matches
        .get_one::<String>("chapter")
        .ok_or_else(|| anyhow!("Chapter is required"))?;

    let book = resolve_book(catalog, book_arg)?;
    let chapter = resolve_chapter(catalog, book, chapter_arg)?;
    let index = catalog.file_index(book, chapter)?;

    println!("{}", style(catalog.track_name(index)?).bold());
    println!("  File index: {}", index);
    println!("  Previous:   {}", catalog.previous_file_index(index));
    println!("  Next:       {}", catalog.next_file_index(index));
    println!("  URI:        {}", catalog.file_uri(index)?);
    Ok(())
}

/// `config init|show|path`
pub fn config_command(manager: &ConfigManager, config: &Config, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("init", _)) => {
            if manager.initialize().context("Failed to write default config")? {
                println!("Created {}", manager.config_path().display());
            } else {
                println!(
                    "{} already exists",
                    manager.config_path().display()
                );
            }
            Ok(())
        }
        Some(("show", _)) => {
            let text = toml::to_string_pretty(config).context("Failed to render config")?;
            println!("{}", text);
            if let Err(errors) = config.validate() {
                for error in errors {
                    println!("{} {}", style("warning:").yellow(), error);
                }
            }
            Ok(())
        }
        Some(("path", _)) => {
            println!("{}", manager.config_path().display());
            Ok(())
        }
        _ => bail!("Unknown config command"),
    }
}
