//! Book/chapter catalog and ring navigation

use crate::canon;
use crate::error::{CatalogError, CatalogResult};
use crate::locator::MediaLocator;
use serde::{Deserialize, Serialize};

/// One book of the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookEntry {
    pub name: String,
    pub chapters: usize,
}

impl BookEntry {
    pub fn new(name: impl Into<String>, chapters: usize) -> Self {
        Self {
            name: name.into(),
            chapters,
        }
    }
}

/// A named run of consecutive books, e.g. "New Testament"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub first_book: usize,
}

impl Section {
    pub fn new(name: impl Into<String>, first_book: usize) -> Self {
        Self {
            name: name.into(),
            first_book,
        }
    }
}

/// Zero-based (book, chapter) coordinates of a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackRef {
    pub book: usize,
    pub chapter: usize,
}

/// Immutable, ordered definition of every playable track
///
/// `offsets[b]` holds the file index of chapter 0 of book `b`, so the mapping
/// `(book, chapter) -> file_index` is gap-free and strictly increasing.
#[derive(Debug, Clone)]
pub struct Catalog {
    books: Vec<BookEntry>,
    offsets: Vec<usize>,
    total: usize,
    sections: Vec<Section>,
    locator: MediaLocator,
}

impl Catalog {
    /// Builds a catalog from a custom book list
    ///
    /// The catalog starts with a single section spanning every book.
    pub fn from_books(books: Vec<BookEntry>) -> CatalogResult<Self> {
        if books.is_empty() {
            return Err(CatalogError::Empty);
        }
        if let Some(book) = books.iter().find(|b| b.chapters == 0) {
            return Err(CatalogError::NoChapters {
                name: book.name.clone(),
            });
        }

        Ok(Self::build(books, vec![Section::new("All", 0)]))
    }

    /// The built-in 66-book canon split into Old and New Testament sections
    pub fn bible() -> Self {
        let books = canon::BOOKS
            .iter()
            .map(|(name, chapters)| BookEntry::new(*name, *chapters))
            .collect();
        let sections = canon::SECTIONS
            .iter()
            .map(|(name, first)| Section::new(*name, *first))
            .collect();
        Self::build(books, sections)
    }

    fn build(books: Vec<BookEntry>, sections: Vec<Section>) -> Self {
        let mut offsets = Vec::with_capacity(books.len());
        let mut total = 0;
        for book in &books {
            offsets.push(total);
            total += book.chapters;
        }

        Self {
            books,
            offsets,
            total,
            sections,
            locator: MediaLocator::default(),
        }
    }

    /// Replaces the section table
    ///
    /// Sections must start at book 0 and have strictly increasing first books
    /// inside the book range.
    pub fn with_sections(mut self, sections: Vec<Section>) -> CatalogResult<Self> {
        match sections.first() {
            None => return Err(CatalogError::InvalidSections("no sections".to_string())),
            Some(first) if first.first_book != 0 => {
                return Err(CatalogError::InvalidSections(format!(
                    "first section '{}' must start at book 0",
                    first.name
                )))
            }
            Some(_) => {}
        }

        for pair in sections.windows(2) {
            if pair[1].first_book <= pair[0].first_book {
                return Err(CatalogError::InvalidSections(format!(
                    "section '{}' must start after '{}'",
                    pair[1].name, pair[0].name
                )));
            }
        }

        if let Some(last) = sections.last() {
            if last.first_book >= self.books.len() {
                return Err(CatalogError::InvalidSections(format!(
                    "section '{}' starts past the last book",
                    last.name
                )));
            }
        }

        self.sections = sections;
        Ok(self)
    }

    /// Replaces the media locator used by [`Catalog::file_uri`]
    pub fn with_locator(mut self, locator: MediaLocator) -> Self {
        self.locator = locator;
        self
    }

    pub fn books(&self) -> &[BookEntry] {
        &self.books
    }

    pub fn book_count(&self) -> usize {
        self.books.len()
    }

    pub fn total_tracks(&self) -> usize {
        self.total
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn locator(&self) -> &MediaLocator {
        &self.locator
    }

    pub fn book(&self, book: usize) -> CatalogResult<&BookEntry> {
        self.books.get(book).ok_or(CatalogError::BookOutOfRange {
            book,
            book_count: self.books.len(),
        })
    }

    pub fn book_name(&self, book: usize) -> CatalogResult<&str> {
        self.book(book).map(|b| b.name.as_str())
    }

    pub fn chapter_count(&self, book: usize) -> CatalogResult<usize> {
        self.book(book).map(|b| b.chapters)
    }

    /// A single-chapter book is itself one playable track
    pub fn is_single_chapter(&self, book: usize) -> CatalogResult<bool> {
        self.chapter_count(book).map(|c| c == 1)
    }

    /// Returns true if `file_index` names a track in this catalog
    pub fn contains(&self, file_index: usize) -> bool {
        file_index < self.total
    }

    /// Flattened index of `(book, chapter)`
    pub fn file_index(&self, book: usize, chapter: usize) -> CatalogResult<usize> {
        let chapter_count = self.chapter_count(book)?;
        if chapter >= chapter_count {
            return Err(CatalogError::ChapterOutOfRange {
                book,
                chapter,
                chapter_count,
            });
        }
        Ok(self.offsets[book] + chapter)
    }

    /// Inverse of [`Catalog::file_index`]
    pub fn locate(&self, file_index: usize) -> CatalogResult<TrackRef> {
        self.check_index(file_index)?;
        // offsets[0] == 0, so at least one offset is <= file_index
        let book = self.offsets.partition_point(|&offset| offset <= file_index) - 1;
        Ok(TrackRef {
            book,
            chapter: file_index - self.offsets[book],
        })
    }

    /// The track after `current`, wrapping to 0 after the last track
    ///
    /// `current` is reduced modulo the track count first.
    pub fn next_file_index(&self, current: usize) -> usize {
        (current % self.total + 1) % self.total
    }

    /// The track before `current`, wrapping to the last track before 0
    pub fn previous_file_index(&self, current: usize) -> usize {
        (current % self.total + self.total - 1) % self.total
    }

    /// Display name: "Book Chapter N", or just "Book" for single-chapter books
    pub fn track_name(&self, file_index: usize) -> CatalogResult<String> {
        let track = self.locate(file_index)?;
        let book = &self.books[track.book];
        if book.chapters == 1 {
            Ok(book.name.clone())
        } else {
            Ok(format!("{} Chapter {}", book.name, track.chapter + 1))
        }
    }

    /// Playable resource locator for a track
    pub fn file_uri(&self, file_index: usize) -> CatalogResult<String> {
        let track = self.locate(file_index)?;
        Ok(self.locator.render(
            track.book,
            track.chapter,
            file_index,
            &self.books[track.book].name,
        ))
    }

    /// Section containing `book`
    pub fn section_of(&self, book: usize) -> CatalogResult<(usize, &Section)> {
        self.book(book)?;
        let position = self
            .sections
            .iter()
            .rposition(|s| s.first_book <= book)
            .unwrap_or(0);
        Ok((position, &self.sections[position]))
    }

    /// First book of the given section, if the section exists
    pub fn section_first_book(&self, section: usize) -> Option<usize> {
        self.sections.get(section).map(|s| s.first_book)
    }

    fn check_index(&self, file_index: usize) -> CatalogResult<()> {
        if self.contains(file_index) {
            Ok(())
        } else {
            Err(CatalogError::FileIndexOutOfRange {
                index: file_index,
                total: self.total,
            })
        }
    }
}
