//! Per-provider pacing.
//!
//! A [`RateLimiter`] enforces a minimum wall-clock gap between consecutive
//! calls passing through it, across every thread that shares the instance.
//! The check, the sleep and the timestamp update all happen under one lock,
//! so queued callers are paced relative to each other rather than to the
//! time they arrived.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::error::SearchError;

/// Something that paces callers before they reach a provider.
pub trait Pacer: Send + Sync {
    /// Block until the caller is allowed to proceed.
    fn wait(&self);

    /// Number of callers that have passed through so far.
    fn calls(&self) -> u64;
}

/// Global (not per-thread) minimum-interval limiter.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
    calls: AtomicU64,
}

impl RateLimiter {
    /// Create a limiter allowing at most `calls_per_second` calls per second.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `calls_per_second` is not a
    /// positive finite number.
    pub fn new(calls_per_second: f64) -> Result<Self, SearchError> {
        if !calls_per_second.is_finite() || calls_per_second <= 0.0 {
            return Err(SearchError::Config(format!(
                "calls_per_second must be greater than 0, got {calls_per_second}"
            )));
        }
        let min_interval = Duration::try_from_secs_f64(1.0 / calls_per_second)
            .map_err(|e| SearchError::Config(format!("invalid rate limit interval: {e}")))?;
        Ok(Self::with_interval(min_interval))
    }

    /// Create a limiter with an explicit minimum interval.
    pub fn with_interval(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
            calls: AtomicU64::new(0),
        }
    }

    /// The enforced gap between calls.
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

impl Pacer for RateLimiter {
    fn wait(&self) {
        // Held across the sleep: later callers queue here.
        let mut last_call = self.last_call.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = *last_call {
            let gap = previous.elapsed();
            if gap < self.min_interval {
                let pause = self.min_interval - gap;
                tracing::trace!(pause_ms = pause.as_millis() as u64, "rate limiter pausing");
                std::thread::sleep(pause);
            }
        }
        *last_call = Some(Instant::now());
        self.calls.fetch_add(1, Ordering::Relaxed);
    }

    fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}
