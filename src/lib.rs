//! adforge: product image sourcing over unreliable image search providers.
//!
//! For every product in a batch the pipeline asks [`adforge_search`] for
//! candidate images, downloads them, and keeps only content it has not
//! already seen during the run:
//! Product list → worker pool → SearchManager → download → content dedup
//!
//! # Architecture
//!
//! - **Search**: priority-ordered provider fallback with per-provider rate
//!   limiting and circuit breaking (the `adforge-search` crate)
//! - **Worker pool**: a fixed number of threads pulling products off a
//!   bounded queue; all of them share one search manager
//! - **Download**: blocking fetches fingerprinted with BLAKE3 and checked
//!   against a run-wide registry
//!
//! A product whose search is exhausted is reported as a placeholder and
//! never affects the rest of the batch.

pub mod config;
pub mod download;
pub mod error;
pub mod pipeline;

pub use config::{AppConfig, PipelineConfig};
pub use download::{DownloadStage, HttpFetcher, ImageFetcher, StoredImage};
pub use error::{AppError, Result};
pub use pipeline::{Pipeline, Product, ProductOutcome, ProductReport, RunSummary};
