//! Search configuration with sensible defaults.
//!
//! [`SearchConfig`] controls which providers are consulted and in what
//! order, how hard each provider may be driven, and when the manager stops
//! falling back to lower-priority providers. It deserializes from TOML or
//! JSON with every field optional.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// How a breaker treats failures recorded while it is already open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenPolicy {
    /// The open timestamp is written once, on the threshold-crossing failure.
    #[default]
    TripOnce,
    /// Every failure at or above the threshold restarts the cooldown window.
    Extend,
}

/// Configuration consumed by the search manager and the built-in providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Provider identifiers in priority order. Repeats after the first
    /// occurrence are ignored.
    pub priority: Vec<String>,
    /// Per-provider pacing, in calls per second. Must be > 0.
    pub calls_per_second: f64,
    /// Consecutive failures that open a provider's breaker. Must be >= 1.
    pub breaker_threshold: u32,
    /// Seconds an open breaker stays open before resetting.
    pub breaker_cooldown_secs: f64,
    /// Whether failures while open extend the cooldown.
    pub breaker_open_policy: OpenPolicy,
    /// Stop consulting further providers once this many unique results exist.
    pub min_results_fallback: usize,
    /// Seconds to sleep between consecutive providers within one search.
    pub inter_provider_delay_secs: f64,
    /// Upper bound on results returned from one search.
    pub max_results: usize,
    /// Number of results requested from each provider.
    pub per_provider_limit: usize,
    /// Per-request HTTP timeout in seconds for the built-in providers.
    pub timeout_seconds: u64,
    /// Custom User-Agent. If `None`, a browser User-Agent is picked per provider.
    pub user_agent: Option<String>,
    /// Advisory text appended to every query by the built-in providers.
    pub query_suffix: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            priority: vec!["bing".into(), "duckduckgo".into(), "wikimedia".into()],
            calls_per_second: 1.0,
            breaker_threshold: 5,
            breaker_cooldown_secs: 120.0,
            breaker_open_policy: OpenPolicy::TripOnce,
            min_results_fallback: 10,
            inter_provider_delay_secs: 1.0,
            max_results: 100,
            per_provider_limit: 50,
            timeout_seconds: 15,
            user_agent: None,
            query_suffix: String::new(),
        }
    }
}

impl SearchConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `priority` must not be empty
    /// - `calls_per_second` must be finite and greater than 0
    /// - `breaker_threshold` must be at least 1
    /// - `breaker_cooldown_secs` and `inter_provider_delay_secs` must be finite,
    ///   >= 0 and representable as a `Duration`
    /// - `max_results`, `per_provider_limit` and `timeout_seconds` must be greater than 0
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.priority.is_empty() {
            return Err(SearchError::Config(
                "at least one provider must be listed in priority".into(),
            ));
        }
        if !self.calls_per_second.is_finite() || self.calls_per_second <= 0.0 {
            return Err(SearchError::Config(format!(
                "calls_per_second must be greater than 0, got {}",
                self.calls_per_second
            )));
        }
        if self.breaker_threshold == 0 {
            return Err(SearchError::Config(
                "breaker_threshold must be at least 1".into(),
            ));
        }
        self.breaker_cooldown()?;
        self.inter_provider_delay()?;
        if self.max_results == 0 {
            return Err(SearchError::Config(
                "max_results must be greater than 0".into(),
            ));
        }
        if self.per_provider_limit == 0 {
            return Err(SearchError::Config(
                "per_provider_limit must be greater than 0".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(SearchError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Provider identifiers in priority order with repeats removed.
    pub fn priority_order(&self) -> Vec<&str> {
        let mut order: Vec<&str> = Vec::with_capacity(self.priority.len());
        for id in &self.priority {
            if !order.contains(&id.as_str()) {
                order.push(id);
            }
        }
        order
    }

    /// How long an open breaker stays open.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `breaker_cooldown_secs` is negative,
    /// not finite, or too large for a [`Duration`].
    pub fn breaker_cooldown(&self) -> Result<Duration, SearchError> {
        secs_to_duration("breaker_cooldown_secs", self.breaker_cooldown_secs)
    }

    /// Pause between providers within one search.
    ///
    /// # Errors
    ///
    /// Same as [`SearchConfig::breaker_cooldown`], for `inter_provider_delay_secs`.
    pub fn inter_provider_delay(&self) -> Result<Duration, SearchError> {
        secs_to_duration("inter_provider_delay_secs", self.inter_provider_delay_secs)
    }

    /// The query a built-in provider should send, with the advisory suffix applied.
    pub fn augmented_query(&self, query: &str) -> String {
        let suffix = self.query_suffix.trim();
        if suffix.is_empty() {
            query.trim().to_string()
        } else {
            format!("{} {suffix}", query.trim())
        }
    }
}

/// Convert a seconds field to a [`Duration`]. Negative, non-finite and
/// unrepresentable values are rejected rather than clamped.
fn secs_to_duration(field: &str, secs: f64) -> Result<Duration, SearchError> {
    Duration::try_from_secs_f64(secs).map_err(|_| {
        SearchError::Config(format!(
            "{field} must be a finite number of seconds >= 0, got {secs}"
        ))
    })
}
