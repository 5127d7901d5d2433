//! Per-provider circuit breaker.
//!
//! Converts a streak of consecutive provider failures into a fail-fast
//! window. Once the cooldown has elapsed, the next [`FailureGate::is_open`]
//! check resets the breaker fully to closed; there is no single-probe
//! half-open phase.
//!
//! # State Machine
//!
//! ```text
//! ┌────────┐  threshold failures  ┌────────┐
//! │ Closed ├─────────────────────►│  Open  │
//! └───▲────┘                      └───┬────┘
//!     │   success, or is_open() after │
//!     │   cooldown has elapsed        │
//!     └───────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::clock::{Clock, SystemClock};
use crate::config::OpenPolicy;
use crate::error::SearchError;

/// Observable breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls are allowed through.
    Closed,
    /// Calls are skipped until the cooldown elapses.
    Open,
}

/// Something that decides whether a provider may be called right now.
pub trait FailureGate: Send + Sync {
    /// Whether callers must skip the provider. May reset an expired window.
    fn is_open(&self) -> bool;

    /// Record a successful call.
    fn record_success(&self);

    /// Record a failed call.
    fn record_failure(&self);

    /// Current consecutive failure count.
    fn failure_count(&self) -> u32;

    /// Snapshot of the state without triggering a cooldown reset.
    fn state(&self) -> CircuitState;
}

/// Configuration for circuit breaker behaviour.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,
    /// How long the circuit stays open.
    pub cooldown: Duration,
    /// Treatment of failures recorded while already open.
    pub open_policy: OpenPolicy,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown: Duration::from_secs(120),
            open_policy: OpenPolicy::TripOnce,
        }
    }
}

#[derive(Debug, Default)]
struct BreakerState {
    failure_count: u32,
    opened_at: Option<Instant>,
}

/// Consecutive-failure circuit breaker guarding one provider.
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<BreakerState>,
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish()
    }
}

impl CircuitBreaker {
    /// Create a breaker on the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the threshold is zero.
    pub fn new(config: CircuitBreakerConfig) -> Result<Self, SearchError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a breaker reading time from `clock`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the threshold is zero.
    pub fn with_clock(
        config: CircuitBreakerConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SearchError> {
        if config.failure_threshold == 0 {
            return Err(SearchError::Config(
                "breaker_threshold must be at least 1".into(),
            ));
        }
        Ok(Self {
            config,
            clock,
            state: Mutex::new(BreakerState::default()),
        })
    }

    /// The breaker's configuration.
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }
}

impl FailureGate for CircuitBreaker {
    fn is_open(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let Some(opened_at) = state.opened_at else {
            return false;
        };
        let elapsed = self.clock.now().saturating_duration_since(opened_at);
        if elapsed >= self.config.cooldown {
            tracing::debug!(
                elapsed_ms = elapsed.as_millis() as u64,
                "circuit cooldown elapsed, closing"
            );
            state.opened_at = None;
            state.failure_count = 0;
            false
        } else {
            true
        }
    }

    fn record_success(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.failure_count = 0;
        state.opened_at = None;
    }

    fn record_failure(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.failure_count = state.failure_count.saturating_add(1);
        if state.failure_count < self.config.failure_threshold {
            return;
        }
        let should_stamp = match self.config.open_policy {
            OpenPolicy::TripOnce => state.opened_at.is_none(),
            OpenPolicy::Extend => true,
        };
        if should_stamp {
            if state.opened_at.is_none() {
                tracing::warn!(failures = state.failure_count, "circuit opened");
            }
            state.opened_at = Some(self.clock.now());
        }
    }

    fn failure_count(&self) -> u32 {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .failure_count
    }

    fn state(&self) -> CircuitState {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.opened_at.is_some() {
            CircuitState::Open
        } else {
            CircuitState::Closed
        }
    }
}
