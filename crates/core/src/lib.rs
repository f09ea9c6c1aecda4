//! Lectern core: the track catalog
//!
//! Every playable unit is one chapter of one book, flattened into a single
//! ordered sequence of file indices. Navigation wraps around at both ends so
//! the library behaves as a ring.
//!
//! ```rust
//! use lectern_core::Catalog;
//!
//! let catalog = Catalog::bible();
//! let genesis_one = catalog.file_index(0, 0).unwrap();
//! assert_eq!(catalog.track_name(genesis_one).unwrap(), "Genesis Chapter 1");
//! assert_eq!(catalog.previous_file_index(genesis_one), catalog.total_tracks() - 1);
//! ```

mod canon;
mod catalog;
mod error;
mod locator;
mod state;

pub use canon::{NEW_TESTAMENT_FIRST_BOOK, OLD_TESTAMENT_FIRST_BOOK};
pub use catalog::{BookEntry, Catalog, Section, TrackRef};
pub use error::{CatalogError, CatalogResult};
pub use locator::{MediaLocator, DEFAULT_BASE_URI, DEFAULT_FILE_PATTERN};
pub use state::MediaState;
