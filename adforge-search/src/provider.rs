//! Provider abstraction and the shared resilience wrapper.
//!
//! Each image search backend implements [`ImageProvider`]. The manager
//! never calls a provider directly; it goes through [`ResilientProvider`],
//! which applies the provider's breaker and rate limiter uniformly and
//! absorbs every provider error.

use std::sync::Arc;

use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, FailureGate};
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::rate_limit::{Pacer, RateLimiter};
use crate::types::ImageResult;

/// A pluggable image search backend.
///
/// Implementors handle their own request construction, timeouts and
/// response parsing. All implementations must be `Send + Sync`: one
/// instance is shared by every worker thread.
pub trait ImageProvider: Send + Sync {
    /// Stable identifier used in configuration and attribution.
    fn name(&self) -> &str;

    /// Run a search and return up to `limit` results in the provider's order.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] on network or parse failure.
    fn search(&self, query: &str, limit: usize) -> Result<Vec<ImageResult>, SearchError>;
}

/// A provider wrapped with its own pacing and failure isolation.
pub struct ResilientProvider {
    inner: Box<dyn ImageProvider>,
    pacer: Arc<dyn Pacer>,
    gate: Arc<dyn FailureGate>,
}

impl ResilientProvider {
    /// Wrap `inner` with explicit pacing and failure-isolation backends.
    pub fn new(
        inner: Box<dyn ImageProvider>,
        pacer: Arc<dyn Pacer>,
        gate: Arc<dyn FailureGate>,
    ) -> Self {
        Self { inner, pacer, gate }
    }

    /// Wrap `inner` with an in-process limiter and breaker built from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for a non-positive rate, an unusable
    /// cooldown, or a zero threshold.
    pub fn from_config(
        inner: Box<dyn ImageProvider>,
        config: &SearchConfig,
    ) -> Result<Self, SearchError> {
        let limiter = RateLimiter::new(config.calls_per_second)?;
        let breaker = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: config.breaker_threshold,
            cooldown: config.breaker_cooldown()?,
            open_policy: config.breaker_open_policy,
        })?;
        Ok(Self::new(inner, Arc::new(limiter), Arc::new(breaker)))
    }

    /// The wrapped provider's identifier.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// The pacing backend.
    pub fn pacer(&self) -> &Arc<dyn Pacer> {
        &self.pacer
    }

    /// The failure-isolation backend.
    pub fn gate(&self) -> &Arc<dyn FailureGate> {
        &self.gate
    }

    /// Search without ever failing.
    ///
    /// An open breaker skips the provider entirely. Otherwise the call is
    /// paced, and its outcome recorded: errors become an empty batch plus
    /// a breaker failure. Results with an empty URL are dropped.
    pub fn safe_search(&self, query: &str, limit: usize) -> Vec<ImageResult> {
        let provider = self.inner.name();
        if self.gate.is_open() {
            tracing::debug!(provider, "circuit open, skipping provider");
            return Vec::new();
        }

        self.pacer.wait();

        match self.inner.search(query, limit) {
            Ok(mut results) => {
                self.gate.record_success();
                let before = results.len();
                results.retain(|r| !r.url.is_empty());
                if results.len() != before {
                    tracing::debug!(
                        provider,
                        dropped = before - results.len(),
                        "dropped results without a URL"
                    );
                }
                tracing::debug!(provider, count = results.len(), "provider returned results");
                results
            }
            Err(err) => {
                self.gate.record_failure();
                tracing::warn!(
                    provider,
                    error = %err,
                    failures = self.gate.failure_count(),
                    "provider search failed"
                );
                Vec::new()
            }
        }
    }
}

impl std::fmt::Debug for ResilientProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientProvider")
            .field("name", &self.inner.name())
            .field("calls", &self.pacer.calls())
            .field("failures", &self.gate.failure_count())
            .finish()
    }
}
