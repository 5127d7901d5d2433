//! Built-in image search providers.
//!
//! Each module provides a struct implementing [`crate::provider::ImageProvider`].
//! They are swappable collaborators: the manager only ever sees the trait.

pub mod bing;
pub mod duckduckgo;
pub mod wikimedia;

pub use bing::BingProvider;
pub use duckduckgo::DuckDuckGoProvider;
pub use wikimedia::WikimediaProvider;
