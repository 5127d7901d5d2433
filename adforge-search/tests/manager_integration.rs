//! Integration tests for the search manager.
//!
//! Providers are scripted in-process (no network). Each scenario exercises
//! the manager through the public API only: registry construction, fallback
//! traversal, deduplication, breaker behaviour and concurrent use.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use adforge_search::clock::ManualClock;
use adforge_search::{
    CircuitBreaker, CircuitBreakerConfig, FailureGate, ImageProvider, ImageResult, OpenPolicy,
    Pacer, ProviderRegistry, RateLimiter, ResilientProvider, SearchConfig, SearchError,
    SearchManager,
};

/// What a scripted provider does on each call.
#[derive(Clone)]
enum Script {
    Return(Vec<&'static str>),
    Fail,
}

struct ScriptedProvider {
    name: &'static str,
    script: Script,
    calls: Arc<AtomicUsize>,
}

impl ImageProvider for ScriptedProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn search(&self, _query: &str, limit: usize) -> Result<Vec<ImageResult>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Return(urls) => Ok(urls
                .iter()
                .take(limit)
                .map(|u| ImageResult::new(*u, self.name))
                .collect()),
            Script::Fail => Err(SearchError::Http(format!("{} is down", self.name))),
        }
    }
}

/// Register scripted providers and return their call counters.
fn registry_with(
    scripts: Vec<(&'static str, Script)>,
) -> (ProviderRegistry, Vec<Arc<AtomicUsize>>) {
    let mut registry = ProviderRegistry::new();
    let mut counters = Vec::new();
    for (name, script) in scripts {
        let calls = Arc::new(AtomicUsize::new(0));
        counters.push(calls.clone());
        registry.register(name, move |_| {
            Ok(Box::new(ScriptedProvider {
                name,
                script: script.clone(),
                calls: calls.clone(),
            }))
        });
    }
    (registry, counters)
}

fn config(priority: &[&str], min_results_fallback: usize) -> SearchConfig {
    SearchConfig {
        priority: priority.iter().map(|p| p.to_string()).collect(),
        calls_per_second: 1000.0,
        inter_provider_delay_secs: 0.0,
        min_results_fallback,
        ..Default::default()
    }
}

fn urls(results: &[ImageResult]) -> Vec<&str> {
    results.iter().map(|r| r.url.as_str()).collect()
}

#[test]
fn end_to_end_two_providers_with_overlap() {
    let (registry, calls) = registry_with(vec![
        ("a", Script::Return(vec!["u1", "u2", "u3"])),
        ("b", Script::Return(vec!["u3", "u4"])),
    ]);
    let cfg = SearchConfig {
        inter_provider_delay_secs: 0.1,
        ..config(&["a", "b"], 10)
    };
    let manager = SearchManager::new(cfg, &registry).expect("manager");

    let start = Instant::now();
    let results = manager.search("red mug", 100).expect("results");
    let elapsed = start.elapsed();

    assert_eq!(urls(&results), vec!["u1", "u2", "u3", "u4"]);
    assert!(results.iter().all(|r| r.width == 0 && r.height == 0));
    assert_eq!(calls[0].load(Ordering::SeqCst), 1);
    assert_eq!(calls[1].load(Ordering::SeqCst), 1);
    // Exactly one inter-provider pause.
    assert!(elapsed >= Duration::from_millis(100));
    assert!(elapsed < Duration::from_millis(200), "took {elapsed:?}");
}

#[test]
fn early_stop_skips_lower_priority_providers() {
    let ten: Vec<&'static str> = vec!["a0", "a1", "a2", "a3", "a4", "a5", "a6", "a7", "a8", "a9"];
    let (registry, calls) = registry_with(vec![
        ("a", Script::Return(ten)),
        ("b", Script::Return(vec!["b0"])),
        ("c", Script::Return(vec!["c0"])),
    ]);
    let manager = SearchManager::new(config(&["a", "b", "c"], 10), &registry).expect("manager");

    let results = manager.search("red mug", 100).expect("results");
    assert_eq!(results.len(), 10);
    assert_eq!(calls[1].load(Ordering::SeqCst), 0);
    assert_eq!(calls[2].load(Ordering::SeqCst), 0);

    let health = manager.health_report();
    assert_eq!(health[0].calls, 1);
    assert_eq!(health[1].calls, 0);
    assert_eq!(health[2].calls, 0);
}

#[test]
fn duplicates_do_not_count_toward_fallback_threshold() {
    let (registry, calls) = registry_with(vec![
        ("a", Script::Return(vec!["u1", "u2"])),
        ("b", Script::Return(vec!["u1", "u2"])),
        ("c", Script::Return(vec!["u3"])),
    ]);
    let manager = SearchManager::new(config(&["a", "b", "c"], 3), &registry).expect("manager");
    let results = manager.search("red mug", 100).expect("results");
    assert_eq!(urls(&results), vec!["u1", "u2", "u3"]);
    assert_eq!(calls[2].load(Ordering::SeqCst), 1);
}

#[test]
fn exhausted_when_every_provider_is_empty() {
    let (registry, _) = registry_with(vec![
        ("a", Script::Fail),
        ("b", Script::Return(vec![])),
    ]);
    let manager = SearchManager::new(config(&["a", "b"], 10), &registry).expect("manager");
    let err = manager.search("red mug", 100).unwrap_err();
    assert!(err.is_exhausted());
    assert!(err.to_string().starts_with("search exhausted"));
}

#[test]
fn bounded_even_when_providers_find_many() {
    let many: Vec<&'static str> = (0..100)
        .map(|i| &*Box::leak(format!("https://img.example/{i}.jpg").into_boxed_str()))
        .collect();
    let (registry, _) = registry_with(vec![
        ("a", Script::Return(many[..50].to_vec())),
        ("b", Script::Return(many[50..].to_vec())),
    ]);
    let manager = SearchManager::new(config(&["a", "b"], 1000), &registry).expect("manager");
    let results = manager.search("red mug", 5).expect("results");
    assert_eq!(results.len(), 5);
    assert_eq!(results[0].url, "https://img.example/0.jpg");
}

#[test]
fn failing_provider_trips_and_is_then_skipped() {
    let (registry, calls) = registry_with(vec![
        ("flaky", Script::Fail),
        ("steady", Script::Return(vec!["u1"])),
    ]);
    let cfg = SearchConfig {
        breaker_threshold: 3,
        breaker_cooldown_secs: 600.0,
        ..config(&["flaky", "steady"], 10)
    };
    let manager = SearchManager::new(cfg, &registry).expect("manager");

    for _ in 0..5 {
        let results = manager.search("red mug", 100).expect("steady provider answers");
        assert_eq!(urls(&results), vec!["u1"]);
    }

    // Three real attempts, then fail-fast skips.
    assert_eq!(calls[0].load(Ordering::SeqCst), 3);
    assert_eq!(calls[1].load(Ordering::SeqCst), 5);
    let health = manager.health_report();
    assert!(health[0].open);
    assert_eq!(health[0].failure_count, 3);
    assert!(!health[1].open);
}

#[test]
fn breaker_cooldown_with_injected_clock() {
    let clock = Arc::new(ManualClock::new());
    let breaker = Arc::new(
        CircuitBreaker::with_clock(
            CircuitBreakerConfig {
                failure_threshold: 5,
                cooldown: Duration::from_secs(120),
                open_policy: OpenPolicy::TripOnce,
            },
            clock.clone(),
        )
        .expect("breaker"),
    );
    let calls = Arc::new(AtomicUsize::new(0));
    let provider = ResilientProvider::new(
        Box::new(ScriptedProvider {
            name: "a",
            script: Script::Fail,
            calls: calls.clone(),
        }),
        Arc::new(RateLimiter::with_interval(Duration::ZERO)),
        breaker.clone(),
    );
    let manager =
        SearchManager::with_providers(config(&["a"], 10), vec![provider]).expect("manager");

    for _ in 0..5 {
        assert!(manager.search("mug", 10).is_err());
    }
    assert_eq!(calls.load(Ordering::SeqCst), 5);

    clock.advance(Duration::from_secs(119));
    assert!(manager.search("mug", 10).is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 5, "still open at 119s");

    clock.advance(Duration::from_secs(1));
    assert!(manager.search("mug", 10).is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 6, "closed again at 120s");
    // The probe failed: one failure on a freshly reset breaker.
    assert_eq!(breaker.failure_count(), 1);
}

#[test]
fn concurrent_searches_share_provider_pacing() {
    let (registry, calls) = registry_with(vec![("a", Script::Return(vec!["u1", "u2"]))]);
    let cfg = SearchConfig {
        calls_per_second: 20.0,
        ..config(&["a"], 1)
    };
    let manager = Arc::new(SearchManager::new(cfg, &registry).expect("manager"));
    let stamps = Arc::new(Mutex::new(Vec::new()));

    let start = Instant::now();
    std::thread::scope(|scope| {
        for _ in 0..8 {
            let manager = Arc::clone(&manager);
            let stamps = Arc::clone(&stamps);
            scope.spawn(move || {
                let results = manager.search("red mug", 10).expect("results");
                assert_eq!(urls(&results), vec!["u1", "u2"]);
                stamps.lock().expect("stamps").push(Instant::now());
            });
        }
    });
    let elapsed = start.elapsed();

    assert_eq!(calls[0].load(Ordering::SeqCst), 8);
    assert_eq!(manager.providers()[0].pacer().calls(), 8);
    // 8 calls at 50ms spacing → at least 7 intervals.
    assert!(elapsed >= Duration::from_millis(350), "took {elapsed:?}");
    assert_eq!(stamps.lock().expect("stamps").len(), 8);
}

#[test]
fn configuration_errors_are_fatal_at_construction() {
    let (registry, _) = registry_with(vec![("a", Script::Return(vec!["u1"]))]);

    let unknown = SearchManager::new(config(&["a", "zzz"], 10), &registry).unwrap_err();
    assert!(matches!(unknown, SearchError::Config(_)));

    let bad_rate = SearchConfig {
        calls_per_second: 0.0,
        ..config(&["a"], 10)
    };
    assert!(SearchManager::new(bad_rate, &registry).is_err());

    let bad_threshold = SearchConfig {
        breaker_threshold: 0,
        ..config(&["a"], 10)
    };
    assert!(SearchManager::new(bad_threshold, &registry).is_err());
}
