//! Error types for the adforge-search crate.
//!
//! Provider failures ([`SearchError::Http`], [`SearchError::Parse`]) never
//! escape the resilient wrapper; only [`SearchError::Exhausted`] and
//! [`SearchError::Config`] reach callers of the manager.

/// Errors that can occur during image search operations.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Every configured provider was visited and none produced a result.
    #[error("search exhausted: {0}")]
    Exhausted(String),

    /// An HTTP request to a provider failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A provider response could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid search configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl SearchError {
    /// Whether this is the aggregate "no candidates at all" condition.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted(_))
    }
}

/// Convenience type alias for adforge-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
