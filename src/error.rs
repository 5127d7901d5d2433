//! Error types for the adforge pipeline.

use adforge_search::SearchError;

/// Top-level error type for the image sourcing pipeline.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Search orchestration error.
    #[error("search error: {0}")]
    Search(#[from] SearchError),

    /// Image download error.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Pipeline coordination error.
    #[error("pipeline error: {0}")]
    Pipeline(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AppError>;
