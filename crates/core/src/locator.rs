//! Resolves a track to a playable resource URI

use serde::{Deserialize, Serialize};

/// Default location of the audio files
pub const DEFAULT_BASE_URI: &str = "file:///usr/share/lectern/audio";

/// Default file name pattern
pub const DEFAULT_FILE_PATTERN: &str = "{book}_{chapter}.mp3";

/// Builds file URIs from a base URI and a file name pattern
///
/// Supported placeholders:
/// - `{book}`: 1-based book number, two digits
/// - `{chapter}`: 1-based chapter number, three digits
/// - `{index}`: 0-based file index
/// - `{slug}`: lowercase book name with runs of non-alphanumerics replaced by `-`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaLocator {
    pub base_uri: String,
    pub file_pattern: String,
}

impl MediaLocator {
    pub fn new(base_uri: impl Into<String>, file_pattern: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            file_pattern: file_pattern.into(),
        }
    }

    /// Renders the URI for a track given its zero-based coordinates
    pub fn render(&self, book: usize, chapter: usize, file_index: usize, book_name: &str) -> String {
        let file_name = self
            .file_pattern
            .replace("{book}", &format!("{:02}", book + 1))
            .replace("{chapter}", &format!("{:03}", chapter + 1))
            .replace("{index}", &file_index.to_string())
            .replace("{slug}", &slugify(book_name));

        let base = self.base_uri.trim_end_matches('/');
        if base.is_empty() {
            file_name
        } else {
            format!("{}/{}", base, file_name)
        }
    }
}

impl Default for MediaLocator {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URI, DEFAULT_FILE_PATTERN)
    }
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_render() {
        let locator = MediaLocator::default();
        assert_eq!(
            locator.render(0, 0, 0, "Genesis"),
            "file:///usr/share/lectern/audio/01_001.mp3"
        );
    }

    #[test]
    fn test_render_all_placeholders() {
        let locator = MediaLocator::new("https://cdn.example.org/audio/", "{index}-{slug}-{book}-{chapter}.ogg");
        assert_eq!(
            locator.render(21, 7, 700, "Song of Solomon"),
            "https://cdn.example.org/audio/700-song-of-solomon-22-008.ogg"
        );
    }

    #[test]
    fn test_empty_base_uri_yields_bare_file_name() {
        let locator = MediaLocator::new("", "{slug}.mp3");
        assert_eq!(locator.render(8, 0, 0, "1 Samuel"), "1-samuel.mp3");
    }

    #[test]
    fn test_slugify_trims_separators() {
        assert_eq!(slugify("  Song of  Solomon! "), "song-of-solomon");
    }
}
