//! Priority-ordered fallback search across providers.
//!
//! [`SearchManager`] visits providers strictly one at a time, in the
//! configured order, merging results by URL in first-seen order. It stops
//! as soon as enough unique results have been gathered, so lower-priority
//! providers are only consulted when the ones above them come up short.
//!
//! One manager is shared by every worker thread. Providers (and their
//! limiter and breaker) are shared with it, so a slow or failing provider
//! throttles every concurrent query that reaches it.

use std::collections::HashSet;
use std::time::Duration;

use crate::circuit_breaker::{CircuitState, FailureGate};
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::provider::{ImageProvider, ResilientProvider};
use crate::rate_limit::Pacer;
use crate::registry::ProviderRegistry;
use crate::types::ImageResult;

/// Point-in-time health of one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderHealth {
    /// Provider identifier.
    pub name: String,
    /// Whether the breaker is currently skipping this provider.
    pub open: bool,
    /// Consecutive failures recorded.
    pub failure_count: u32,
    /// Calls that have passed the rate limiter.
    pub calls: u64,
}

/// Fans a query out across providers in priority order.
#[derive(Debug)]
pub struct SearchManager {
    config: SearchConfig,
    providers: Vec<ResilientProvider>,
    inter_provider_delay: Duration,
}

impl SearchManager {
    /// Build a manager, constructing one provider per priority entry.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the configuration is invalid or
    /// names a provider the registry does not know.
    pub fn new(config: SearchConfig, registry: &ProviderRegistry) -> Result<Self, SearchError> {
        config.validate()?;
        let mut providers = Vec::new();
        for id in config.priority_order() {
            let provider = registry.build(id, &config)?;
            providers.push(ResilientProvider::from_config(provider, &config)?);
        }
        tracing::info!(
            providers = %config.priority_order().join(","),
            "search manager ready"
        );
        let inter_provider_delay = config.inter_provider_delay()?;
        Ok(Self {
            config,
            providers,
            inter_provider_delay,
        })
    }

    /// Build a manager over already-wrapped providers, used in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the configuration is invalid or
    /// `providers` is empty.
    pub fn with_providers(
        config: SearchConfig,
        providers: Vec<ResilientProvider>,
    ) -> Result<Self, SearchError> {
        config.validate()?;
        if providers.is_empty() {
            return Err(SearchError::Config(
                "at least one provider must be supplied".into(),
            ));
        }
        let inter_provider_delay = config.inter_provider_delay()?;
        Ok(Self {
            config,
            providers,
            inter_provider_delay,
        })
    }

    /// Build a manager from bare providers, each wrapped with a limiter and
    /// breaker derived from `config`.
    ///
    /// # Errors
    ///
    /// Same as [`SearchManager::with_providers`].
    pub fn from_providers(
        config: SearchConfig,
        providers: Vec<Box<dyn ImageProvider>>,
    ) -> Result<Self, SearchError> {
        config.validate()?;
        let wrapped = providers
            .into_iter()
            .map(|p| ResilientProvider::from_config(p, &config))
            .collect::<Result<Vec<_>, _>>()?;
        Self::with_providers(config, wrapped)
    }

    /// The manager's configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Providers in visiting order.
    pub fn providers(&self) -> &[ResilientProvider] {
        &self.providers
    }

    /// Search with the configured `max_results`.
    ///
    /// # Errors
    ///
    /// Same as [`SearchManager::search`].
    pub fn search_default(&self, query: &str) -> Result<Vec<ImageResult>, SearchError> {
        self.search(query, self.config.max_results)
    }

    /// Search providers in priority order and return up to `max_results`
    /// unique results.
    ///
    /// Results keep provider priority order, then each provider's own order.
    /// Once `min_results_fallback` unique results exist no further provider
    /// is consulted. `max_results == 0` means the configured default.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Exhausted`] if every visited provider came back
    /// empty, whether from failure, an open breaker, or no hits.
    pub fn search(&self, query: &str, max_results: usize) -> Result<Vec<ImageResult>, SearchError> {
        let max_results = if max_results == 0 {
            self.config.max_results
        } else {
            max_results
        };
        tracing::trace!(query, max_results, "image search");

        let mut combined: Vec<ImageResult> = Vec::new();
        let mut seen_urls: HashSet<String> = HashSet::new();
        let mut visited = 0usize;

        for (position, provider) in self.providers.iter().enumerate() {
            visited += 1;
            let batch = provider.safe_search(query, self.config.per_provider_limit);
            let before = combined.len();
            for result in batch {
                if seen_urls.insert(result.url.clone()) {
                    combined.push(result);
                }
            }
            tracing::debug!(
                provider = provider.name(),
                added = combined.len() - before,
                total = combined.len(),
                "merged provider batch"
            );

            if combined.len() >= self.config.min_results_fallback {
                break;
            }
            let remaining = position + 1 < self.providers.len();
            if remaining {
                if !self.inter_provider_delay.is_zero() {
                    std::thread::sleep(self.inter_provider_delay);
                }
            }
        }

        if combined.is_empty() {
            tracing::warn!(visited, "no provider returned images");
            return Err(SearchError::Exhausted(format!(
                "no results from {visited} provider(s)"
            )));
        }

        combined.truncate(max_results);
        Ok(combined)
    }

    /// Current health of every provider, in visiting order.
    ///
    /// Reads breaker state without triggering a cooldown reset.
    pub fn health_report(&self) -> Vec<ProviderHealth> {
        self.providers
            .iter()
            .map(|p| ProviderHealth {
                name: p.name().to_string(),
                open: p.gate().state() == CircuitState::Open,
                failure_count: p.gate().failure_count(),
                calls: p.pacer().calls(),
            })
            .collect()
    }
}
