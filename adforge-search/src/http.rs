//! Blocking HTTP agent construction for the built-in providers.
//!
//! Every provider owns its own [`ureq::Agent`], so connection pools are
//! never shared between providers.

use std::time::Duration;

use rand::seq::SliceRandom;

use crate::config::SearchConfig;
use crate::error::SearchError;

/// Realistic browser User-Agent strings, one picked per agent.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:133.0) Gecko/20100101 Firefox/133.0",
];

/// Build an agent with the configured timeout and User-Agent.
pub fn build_agent(config: &SearchConfig) -> ureq::Agent {
    let ua = match config.user_agent {
        Some(ref custom) => custom.clone(),
        None => random_user_agent().to_owned(),
    };

    ureq::AgentBuilder::new()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(&ua)
        .redirects(10)
        .build()
}

/// Select a random User-Agent string from the rotation list.
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    USER_AGENTS
        .choose(&mut rng)
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Read a response body, mapping transport and status failures.
///
/// `provider` is used only to label error messages.
pub fn read_body(
    provider: &str,
    outcome: Result<ureq::Response, ureq::Error>,
) -> Result<String, SearchError> {
    let response = match outcome {
        Ok(response) => response,
        Err(ureq::Error::Status(code, _)) => {
            return Err(SearchError::Http(format!("{provider} returned HTTP {code}")));
        }
        Err(e) => {
            return Err(SearchError::Http(format!("{provider} request failed: {e}")));
        }
    };
    response
        .into_string()
        .map_err(|e| SearchError::Http(format!("{provider} response read failed: {e}")))
}
