//! Download stage: fetch candidate images and drop duplicate content.
//!
//! Candidate URLs come from the search manager. Different URLs frequently
//! serve identical bytes (CDN mirrors, resized copies with the same
//! encoding), so every fetched body is fingerprinted and checked against
//! the run-wide [`DedupRegistry`]. Only content never seen before, by any
//! product on any worker, is kept.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use adforge_search::{DedupRegistry, ImageResult};

use crate::config::PipelineConfig;
use crate::error::{AppError, Result};

/// Fetches raw image bytes for a URL.
pub trait ImageFetcher: Send + Sync {
    /// Download the body at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Fetch`] on transport failure, a non-success
    /// status, or a body over the size limit.
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Blocking HTTP fetcher with a size cap.
pub struct HttpFetcher {
    agent: ureq::Agent,
    max_bytes: u64,
}

impl HttpFetcher {
    /// Create a fetcher from pipeline settings.
    pub fn new(config: &PipelineConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.fetch_timeout_seconds))
            .redirects(5)
            .build();
        Self {
            agent,
            max_bytes: config.max_image_bytes,
        }
    }
}

impl ImageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = match self.agent.get(url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => {
                return Err(AppError::Fetch(format!("HTTP {code} for {url}")));
            }
            Err(e) => return Err(AppError::Fetch(format!("request failed: {e}"))),
        };

        let mut body = Vec::new();
        response
            .into_reader()
            .take(self.max_bytes + 1)
            .read_to_end(&mut body)
            .map_err(|e| AppError::Fetch(format!("read failed: {e}")))?;
        if body.len() as u64 > self.max_bytes {
            return Err(AppError::Fetch(format!(
                "image exceeds {} bytes: {url}",
                self.max_bytes
            )));
        }
        if body.is_empty() {
            return Err(AppError::Fetch(format!("empty body: {url}")));
        }
        Ok(body)
    }
}

/// Content-derived identity for a fetched image.
pub fn fingerprint(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// An image kept for a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Where the bytes came from.
    pub url: String,
    /// Provider that found the URL.
    pub source: String,
    /// Content fingerprint.
    pub fingerprint: String,
    /// Body size in bytes.
    pub size: usize,
    /// File written, when an output directory is configured.
    pub path: Option<PathBuf>,
}

/// Fetches candidates until enough fresh images are collected.
pub struct DownloadStage {
    fetcher: Arc<dyn ImageFetcher>,
    registry: Arc<DedupRegistry>,
    images_per_product: usize,
    output_dir: Option<PathBuf>,
}

impl DownloadStage {
    /// Create a stage writing fingerprints into `registry`.
    pub fn new(
        fetcher: Arc<dyn ImageFetcher>,
        registry: Arc<DedupRegistry>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            fetcher,
            registry,
            images_per_product: config.images_per_product,
            output_dir: config.output_dir.clone(),
        }
    }

    /// The run-wide content registry.
    pub fn registry(&self) -> &Arc<DedupRegistry> {
        &self.registry
    }

    /// Walk `candidates` in order, keeping up to `images_per_product`
    /// images whose content has not been seen in this run.
    ///
    /// Fetch failures skip the candidate.
    ///
    /// # Errors
    ///
    /// Returns an I/O error only if writing to the output directory fails.
    pub fn collect(
        &self,
        product_id: &str,
        candidates: &[ImageResult],
    ) -> Result<Vec<StoredImage>> {
        let mut kept = Vec::new();
        for candidate in candidates {
            if kept.len() >= self.images_per_product {
                break;
            }
            let bytes = match self.fetcher.fetch(&candidate.url) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::debug!(product_id, error = %e, "candidate fetch failed");
                    continue;
                }
            };
            let digest = fingerprint(&bytes);
            if !self.registry.add(&digest) {
                tracing::debug!(product_id, fingerprint = %digest, "duplicate content skipped");
                continue;
            }
            let path = match self.output_dir {
                Some(ref dir) => Some(write_image(dir, product_id, &digest, &bytes)?),
                None => None,
            };
            kept.push(StoredImage {
                url: candidate.url.clone(),
                source: candidate.source.clone(),
                fingerprint: digest,
                size: bytes.len(),
                path,
            });
        }
        Ok(kept)
    }
}

fn write_image(dir: &Path, product_id: &str, digest: &str, bytes: &[u8]) -> Result<PathBuf> {
    let product_dir = dir.join(sanitize(product_id));
    std::fs::create_dir_all(&product_dir)?;
    let path = product_dir.join(format!("{digest}.img"));
    std::fs::write(&path, bytes)?;
    Ok(path)
}

/// Keep product ids usable as a single path component.
fn sanitize(id: &str) -> String {
    let cleaned: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "_".into()
    } else {
        cleaned
    }
}
