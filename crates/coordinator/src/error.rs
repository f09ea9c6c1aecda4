// crates/coordinator/src/error.rs

use lectern_core::CatalogError;
use lectern_media_engine::EngineError;
use thiserror::Error;

pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Section {section} does not exist ({count} sections)")]
    UnknownSection { section: usize, count: usize },
}
