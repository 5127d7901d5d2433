//! # adforge-search
//!
//! Prioritised, fault-isolated image search across several unreliable
//! providers.
//!
//! ## Design
//!
//! - Providers are consulted one at a time in configured priority order
//! - Results are merged by URL in first-seen order; search stops early once
//!   enough unique images are found
//! - Each provider has its own rate limiter and circuit breaker, shared by
//!   every thread that uses it, so a failing provider is skipped instead of
//!   hammered
//! - Provider errors never reach the caller; only "no provider produced
//!   anything" ([`SearchError::Exhausted`]) does
//! - A run-scoped [`DedupRegistry`] lets downstream stages suppress
//!   duplicate image content across products
//!
//! Everything is blocking and thread-safe; there is no async runtime.
//!
//! ## Example
//!
//! ```no_run
//! # fn example() -> adforge_search::Result<()> {
//! use adforge_search::{ProviderRegistry, SearchConfig, SearchManager};
//!
//! let manager = SearchManager::new(SearchConfig::default(), &ProviderRegistry::builtin())?;
//! for image in manager.search("red ceramic mug", 20)? {
//!     println!("{} ({}x{}) via {}", image.url, image.width, image.height, image.source);
//! }
//! # Ok(())
//! # }
//! ```

pub mod circuit_breaker;
pub mod clock;
pub mod config;
pub mod dedup;
pub mod error;
pub mod http;
pub mod manager;
pub mod provider;
pub mod providers;
pub mod rate_limit;
pub mod registry;
pub mod types;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState, FailureGate};
pub use config::{OpenPolicy, SearchConfig};
pub use dedup::DedupRegistry;
pub use error::{Result, SearchError};
pub use manager::{ProviderHealth, SearchManager};
pub use provider::{ImageProvider, ResilientProvider};
pub use rate_limit::{Pacer, RateLimiter};
pub use registry::{ProviderFactory, ProviderRegistry};
pub use types::ImageResult;
