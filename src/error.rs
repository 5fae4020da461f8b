//! Error types for loading country data.

use thiserror::Error;

/// Result type for dataset loading.
pub type LoadResult<T> = Result<T, LoadError>;

/// Errors that can occur while loading the country dataset.
///
/// Geometry problems are never reported here: malformed rings degrade to
/// partial meshes instead of failing the load.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Shapefile error: {0}")]
    Shapefile(#[from] shapefile::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dataset contains no countries")]
    Empty,
}
