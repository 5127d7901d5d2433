//! Configuration types for adforge.
//!
//! Loaded from a single TOML file. Every section and field is optional;
//! missing values fall back to their defaults.
//!
//! ```toml
//! [search]
//! priority = ["bing", "wikimedia"]
//! calls_per_second = 0.5
//! min_results_fallback = 20
//!
//! [pipeline]
//! workers = 8
//! images_per_product = 5
//! ```

use std::path::PathBuf;

use adforge_search::SearchConfig;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Provider priority, pacing, breaker and fallback settings.
    pub search: SearchConfig,
    /// Worker pool and download settings.
    pub pipeline: PipelineConfig,
}

/// Settings for the per-product worker pool and download stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of products processed concurrently.
    pub workers: usize,
    /// Fresh images to keep per product.
    pub images_per_product: usize,
    /// Per-download timeout in seconds.
    pub fetch_timeout_seconds: u64,
    /// Downloads larger than this are rejected.
    pub max_image_bytes: u64,
    /// Where fetched images are written, one subdirectory per product.
    /// Nothing is written when unset.
    pub output_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            images_per_product: 10,
            fetch_timeout_seconds: 20,
            max_image_bytes: 20 * 1024 * 1024,
            output_dir: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/adforge/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("adforge").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("adforge")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/adforge-config/config.toml")
        }
    }

    /// Validate both sections.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        self.search
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))?;
        if self.pipeline.workers == 0 {
            return Err(AppError::Config("pipeline.workers must be at least 1".into()));
        }
        if self.pipeline.images_per_product == 0 {
            return Err(AppError::Config(
                "pipeline.images_per_product must be at least 1".into(),
            ));
        }
        if self.pipeline.fetch_timeout_seconds == 0 {
            return Err(AppError::Config(
                "pipeline.fetch_timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.pipeline.max_image_bytes == 0 {
            return Err(AppError::Config(
                "pipeline.max_image_bytes must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
