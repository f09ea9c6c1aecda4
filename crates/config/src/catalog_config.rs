//! `[catalog]`: where audio lives and which books exist

use crate::validation::{ConfigSection, EnvOverrides, Report};
use serde::{Deserialize, Serialize};

/// One book of a custom catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookSpec {
    pub name: String,
    pub chapters: usize,
}

/// One section of a custom catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SectionSpec {
    pub name: String,
    pub first_book: usize,
}

/// Where audio files live and, optionally, which books exist
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    /// Base URI the file pattern is appended to
    pub base_uri: String,

    /// File name pattern; supports {book}, {chapter}, {index} and {slug}
    pub file_pattern: String,

    /// Custom book list; empty means the built-in canon
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub books: Vec<BookSpec>,

    /// Custom section table; empty means the catalog's own default
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<SectionSpec>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_uri: "file:///usr/share/lectern/audio".to_string(),
            file_pattern: "{book}_{chapter}.mp3".to_string(),
            books: Vec::new(),
            sections: Vec::new(),
        }
    }
}

impl CatalogConfig {
    /// True when the built-in canon should be used
    pub fn uses_builtin_books(&self) -> bool {
        self.books.is_empty()
    }
}

impl ConfigSection for CatalogConfig {
    const NAME: &'static str = "catalog";

    fn check(&self, report: &mut Report) {
        report.not_empty("file_pattern", &self.file_pattern);
        report.mentions_any("file_pattern", &self.file_pattern, &["{chapter}", "{index}"]);

        for (i, book) in self.books.iter().enumerate() {
            report.not_empty(&format!("books[{}].name", i), &book.name);
            if book.chapters == 0 {
                report.reject(&format!("books[{}].chapters", i), "must be at least 1", 0);
            }
        }

        if let Some(first) = self.sections.first() {
            if first.first_book != 0 {
                report.reject("sections[0].first_book", "must be 0", first.first_book);
            }
        }
        for (i, pair) in self.sections.windows(2).enumerate() {
            if pair[1].first_book <= pair[0].first_book {
                report.reject(
                    &format!("sections[{}].first_book", i + 1),
                    "must be greater than the previous section's first_book",
                    pair[1].first_book,
                );
            }
        }
    }

    /// Only the scalar fields; book and section tables come from the file
    fn apply_env(&mut self, env: &EnvOverrides<'_>) {
        env.set(Self::NAME, "base_uri", &mut self.base_uri);
        env.set(Self::NAME, "file_pattern", &mut self.file_pattern);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = CatalogConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.uses_builtin_books());
    }

    #[test]
    fn test_empty_base_uri_allowed() {
        let config = CatalogConfig {
            base_uri: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_pattern_must_distinguish_chapters() {
        let config = CatalogConfig {
            file_pattern: "{book}.mp3".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_chapter_book_rejected() {
        let config = CatalogConfig {
            books: vec![
                BookSpec {
                    name: "Mark".to_string(),
                    chapters: 16,
                },
                BookSpec {
                    name: "".to_string(),
                    chapters: 0,
                },
            ],
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "catalog.books[1].name");
        assert_eq!(errors[1].field, "catalog.books[1].chapters");
    }

    #[test]
    fn test_env_overrides_location_only() {
        let lookup = |key: &str| match key {
            "LECTERN_CATALOG_BASE_URI" => Some("https://audio.example.org".to_string()),
            "LECTERN_CATALOG_FILE_PATTERN" => Some("{index}.ogg".to_string()),
            _ => None,
        };
        let mut config = CatalogConfig::default();
        config.apply_env(&EnvOverrides::new(&lookup));

        assert_eq!(config.base_uri, "https://audio.example.org");
        assert_eq!(config.file_pattern, "{index}.ogg");
        assert!(config.uses_builtin_books());
    }

    #[test]
    fn test_sections_must_ascend_from_zero() {
        let config = CatalogConfig {
            sections: vec![
                SectionSpec {
                    name: "Late".to_string(),
                    first_book: 2,
                },
                SectionSpec {
                    name: "Earlier".to_string(),
                    first_book: 1,
                },
            ],
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap_err().len(), 2);
    }
}
