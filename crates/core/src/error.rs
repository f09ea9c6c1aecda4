//! Error types for catalog construction and lookup

use thiserror::Error;

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors raised by the catalog
///
/// Lookups with out-of-range coordinates are caller contract violations. They
/// are reported here instead of panicking so that hosts can decide on a
/// fallback (the playback engine clamps to the first track).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The catalog has no books
    #[error("Catalog must contain at least one book")]
    Empty,

    /// A book was declared with no chapters
    #[error("Book '{name}' must have at least one chapter")]
    NoChapters { name: String },

    /// Book index outside `[0, book_count)`
    #[error("Book index {book} out of range (catalog has {book_count} books)")]
    BookOutOfRange { book: usize, book_count: usize },

    /// Chapter index outside `[0, chapter_count)` for the given book
    #[error("Chapter index {chapter} out of range for book {book} ({chapter_count} chapters)")]
    ChapterOutOfRange {
        book: usize,
        chapter: usize,
        chapter_count: usize,
    },

    /// File index outside `[0, total_tracks)`
    #[error("File index {index} out of range (catalog has {total} tracks)")]
    FileIndexOutOfRange { index: usize, total: usize },

    /// Section table does not describe the book list
    #[error("Invalid sections: {0}")]
    InvalidSections(String),
}
