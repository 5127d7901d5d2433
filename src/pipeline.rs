//! Per-product worker pool.
//!
//! Products are fed through a bounded job queue to a fixed number of worker
//! threads. Every worker shares one [`SearchManager`] (and therefore every
//! provider's limiter and breaker) and one download stage (and therefore the
//! run-wide content registry). A product whose search is exhausted gets a
//! placeholder; it never stops the others.

use std::sync::Arc;

use adforge_search::{DedupRegistry, SearchError, SearchManager};
use crossbeam_channel::bounded;

use crate::config::PipelineConfig;
use crate::download::{DownloadStage, ImageFetcher, StoredImage};
use crate::error::{AppError, Result};

/// One product to source images for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Stable product identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Search query, usually the name.
    pub query: String,
}

impl Product {
    /// A product whose query is its name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            query: name.clone(),
            name,
        }
    }
}

/// Parse a product list, one product per line.
///
/// A line is either `name` or `id<TAB>name`. Blank lines and lines starting
/// with `#` are skipped. Products without an id are numbered by position.
pub fn parse_products(text: &str) -> Vec<Product> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .enumerate()
        .map(|(index, line)| match line.split_once('\t') {
            Some((id, name)) if !id.trim().is_empty() && !name.trim().is_empty() => {
                Product::new(id.trim(), name.trim())
            }
            _ => Product::new(format!("p{:04}", index + 1), line),
        })
        .collect()
}

/// What happened to one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductOutcome {
    /// Search found candidates; `images` holds the fresh ones kept.
    Found {
        /// Candidate URLs returned by search.
        candidates: usize,
        /// Images whose content was new to this run.
        images: Vec<StoredImage>,
    },
    /// No provider produced anything; downstream should use a placeholder.
    Placeholder {
        /// Why no candidates were available.
        reason: String,
    },
    /// The product could not be processed.
    Failed {
        /// Error description.
        reason: String,
    },
}

/// Outcome for one product, tagged with its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductReport {
    /// Product identifier.
    pub product_id: String,
    /// What happened.
    pub outcome: ProductOutcome,
}

/// Aggregate result of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Products processed.
    pub processed: usize,
    /// Products with at least one candidate.
    pub found: usize,
    /// Products that fell back to a placeholder.
    pub placeholders: usize,
    /// Products that failed outright.
    pub failed: usize,
    /// Distinct image contents registered during the run.
    pub unique_images: usize,
    /// Per-product reports, in input order.
    pub reports: Vec<ProductReport>,
}

/// Drives search and download for a batch of products.
pub struct Pipeline {
    manager: Arc<SearchManager>,
    stage: DownloadStage,
    workers: usize,
}

impl Pipeline {
    /// Create a pipeline. `registry` should be fresh for each run.
    pub fn new(
        manager: Arc<SearchManager>,
        fetcher: Arc<dyn ImageFetcher>,
        registry: Arc<DedupRegistry>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            manager,
            stage: DownloadStage::new(fetcher, registry, config),
            workers: config.workers.max(1),
        }
    }

    /// The run-wide content registry.
    pub fn registry(&self) -> &Arc<DedupRegistry> {
        self.stage.registry()
    }

    /// Search and download for a single product.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] for anything other than an exhausted search,
    /// which is reported as [`ProductOutcome::Placeholder`].
    pub fn process(&self, product: &Product) -> Result<ProductOutcome> {
        let candidates = match self.manager.search_default(&product.query) {
            Ok(candidates) => candidates,
            Err(SearchError::Exhausted(reason)) => {
                tracing::info!(
                    product_id = %product.id,
                    %reason,
                    "no candidates, using placeholder"
                );
                return Ok(ProductOutcome::Placeholder { reason });
            }
            Err(e) => return Err(e.into()),
        };
        let images = self.stage.collect(&product.id, &candidates)?;
        tracing::debug!(
            product_id = %product.id,
            candidates = candidates.len(),
            kept = images.len(),
            "product processed"
        );
        Ok(ProductOutcome::Found {
            candidates: candidates.len(),
            images,
        })
    }

    /// Process every product on the worker pool.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Pipeline`] if a worker thread panics.
    pub fn run(&self, products: Vec<Product>) -> Result<RunSummary> {
        let total = products.len();
        let workers = self.workers.min(total.max(1));
        tracing::info!(products = total, workers, "run started");

        let (job_tx, job_rx) = bounded::<(usize, Product)>(workers * 2);
        let (done_tx, done_rx) = crossbeam_channel::unbounded::<(usize, ProductReport)>();

        let worker_result = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    let job_rx = job_rx.clone();
                    let done_tx = done_tx.clone();
                    scope.spawn(move || {
                        for (index, product) in job_rx.iter() {
                            let outcome = self.process(&product).unwrap_or_else(|e| {
                                tracing::warn!(
                                    product_id = %product.id,
                                    error = %e,
                                    "product failed"
                                );
                                ProductOutcome::Failed {
                                    reason: e.to_string(),
                                }
                            });
                            let report = ProductReport {
                                product_id: product.id,
                                outcome,
                            };
                            if done_tx.send((index, report)).is_err() {
                                break;
                            }
                        }
                    })
                })
                .collect();
            drop(job_rx);
            drop(done_tx);

            for job in products.into_iter().enumerate() {
                if job_tx.send(job).is_err() {
                    break;
                }
            }
            drop(job_tx);

            let mut panicked = 0usize;
            for handle in handles {
                if handle.join().is_err() {
                    panicked += 1;
                }
            }
            panicked
        });

        let mut indexed: Vec<(usize, ProductReport)> = done_rx.iter().collect();
        if worker_result > 0 {
            return Err(AppError::Pipeline(format!(
                "{worker_result} worker thread(s) panicked"
            )));
        }
        indexed.sort_by_key(|(index, _)| *index);

        let mut summary = RunSummary {
            processed: indexed.len(),
            unique_images: self.registry().len(),
            ..Default::default()
        };
        for (_, report) in indexed {
            match report.outcome {
                ProductOutcome::Found { .. } => summary.found += 1,
                ProductOutcome::Placeholder { .. } => summary.placeholders += 1,
                ProductOutcome::Failed { .. } => summary.failed += 1,
            }
            summary.reports.push(report);
        }

        tracing::info!(
            processed = summary.processed,
            found = summary.found,
            placeholders = summary.placeholders,
            failed = summary.failed,
            unique_images = summary.unique_images,
            "run finished"
        );
        Ok(summary)
    }
}
