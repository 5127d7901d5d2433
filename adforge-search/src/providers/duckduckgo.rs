//! DuckDuckGo Images provider.
//!
//! Image results come from the `i.js` JSON endpoint, which only answers
//! when given the per-query `vqd` token embedded in the regular results
//! page. A search is therefore two requests: page, then JSON.

use serde::Deserialize;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::http;
use crate::provider::ImageProvider;
use crate::types::ImageResult;

/// Identifier used in configuration.
pub const NAME: &str = "duckduckgo";

const PAGE_URL: &str = "https://duckduckgo.com/";
const IMAGES_URL: &str = "https://duckduckgo.com/i.js";

/// DuckDuckGo Images client.
pub struct DuckDuckGoProvider {
    agent: ureq::Agent,
    config: SearchConfig,
}

impl DuckDuckGoProvider {
    /// Create a provider with its own HTTP agent.
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            agent: http::build_agent(config),
            config: config.clone(),
        }
    }

    fn fetch_vqd(&self, query: &str) -> Result<String, SearchError> {
        let outcome = self
            .agent
            .get(PAGE_URL)
            .query("q", query)
            .query("iax", "images")
            .query("ia", "images")
            .set("Accept", "text/html,application/xhtml+xml")
            .call();
        let html = http::read_body("DuckDuckGo", outcome)?;
        extract_vqd(&html)
            .ok_or_else(|| SearchError::Parse("DuckDuckGo vqd token not found".into()))
    }
}

impl ImageProvider for DuckDuckGoProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn search(&self, query: &str, limit: usize) -> Result<Vec<ImageResult>, SearchError> {
        let query = self.config.augmented_query(query);
        tracing::trace!(query = %query, "DuckDuckGo image search");

        let vqd = self.fetch_vqd(&query)?;
        let outcome = self
            .agent
            .get(IMAGES_URL)
            .query("l", "us-en")
            .query("o", "json")
            .query("q", &query)
            .query("vqd", &vqd)
            .query("f", ",,,,,")
            .query("p", "1")
            .set("Accept", "application/json, text/javascript, */*; q=0.01")
            .set("Referer", PAGE_URL)
            .call();
        let body = http::read_body("DuckDuckGo", outcome)?;

        tracing::trace!(bytes = body.len(), "DuckDuckGo response received");
        parse_ddg_json(&body, limit)
    }
}

/// Pull the `vqd` token out of a results page.
///
/// The token shows up as `vqd="…"`, `vqd='…'` or as a bare `vqd=…&`
/// query parameter depending on the page variant.
fn extract_vqd(html: &str) -> Option<String> {
    for (open, close) in [("vqd=\"", '"'), ("vqd='", '\''), ("vqd=", '&')] {
        if let Some(start) = html.find(open) {
            let rest = &html[start + open.len()..];
            let token: String = rest
                .chars()
                .take_while(|c| *c != close && !c.is_whitespace() && *c != '"' && *c != '\'')
                .collect();
            if !token.is_empty() {
                return Some(token);
            }
        }
    }
    None
}

#[derive(Debug, Deserialize)]
struct ImagesPage {
    #[serde(default)]
    results: Vec<ImageHit>,
}

#[derive(Debug, Deserialize)]
struct ImageHit {
    image: Option<String>,
    title: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Parse the `i.js` JSON payload.
fn parse_ddg_json(body: &str, limit: usize) -> Result<Vec<ImageResult>, SearchError> {
    let page: ImagesPage = serde_json::from_str(body)
        .map_err(|e| SearchError::Parse(format!("DuckDuckGo JSON: {e}")))?;

    let results: Vec<ImageResult> = page
        .results
        .into_iter()
        .filter_map(|hit| {
            let url = hit.image.filter(|u| u.starts_with("http"))?;
            Some(
                ImageResult::new(url, NAME)
                    .with_title(hit.title.as_deref().unwrap_or_default().trim())
                    .with_size(hit.width.unwrap_or(0), hit.height.unwrap_or(0)),
            )
        })
        .take(limit)
        .collect();

    tracing::debug!(count = results.len(), "DuckDuckGo results parsed");
    Ok(results)
}
