//! Provider identifier → constructor mapping.

use std::collections::HashMap;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::provider::ImageProvider;
use crate::providers::{bing, duckduckgo, wikimedia};
use crate::providers::{BingProvider, DuckDuckGoProvider, WikimediaProvider};

/// Builds a provider instance from the search configuration.
pub type ProviderFactory =
    Box<dyn Fn(&SearchConfig) -> Result<Box<dyn ImageProvider>, SearchError> + Send + Sync>;

/// Registry of known provider constructors, keyed by identifier.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: HashMap<String, ProviderFactory>,
}

impl ProviderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in providers.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(bing::NAME, |config| Ok(Box::new(BingProvider::new(config))));
        registry.register(duckduckgo::NAME, |config| {
            Ok(Box::new(DuckDuckGoProvider::new(config)))
        });
        registry.register(wikimedia::NAME, |config| {
            Ok(Box::new(WikimediaProvider::new(config)))
        });
        registry
    }

    /// Register (or replace) the constructor for `id`.
    pub fn register<F>(&mut self, id: impl Into<String>, factory: F)
    where
        F: Fn(&SearchConfig) -> Result<Box<dyn ImageProvider>, SearchError> + Send + Sync + 'static,
    {
        self.factories.insert(id.into(), Box::new(factory));
    }

    /// Whether `id` has a registered constructor.
    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Registered identifiers, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Construct the provider registered under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for an unknown identifier, or
    /// whatever the constructor itself reports.
    pub fn build(
        &self,
        id: &str,
        config: &SearchConfig,
    ) -> Result<Box<dyn ImageProvider>, SearchError> {
        let factory = self.factories.get(id).ok_or_else(|| {
            SearchError::Config(format!(
                "unknown provider '{id}' (known: {})",
                self.ids().join(", ")
            ))
        })?;
        factory(config)
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}
