//! Wikimedia Commons provider.
//!
//! Uses the MediaWiki query API with a file-namespace search generator,
//! which returns direct image URLs and dimensions as JSON.

use std::collections::HashMap;

use serde::Deserialize;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::http;
use crate::provider::ImageProvider;
use crate::types::ImageResult;

/// Identifier used in configuration.
pub const NAME: &str = "wikimedia";

const API_URL: &str = "https://commons.wikimedia.org/w/api.php";

/// The API caps generator results at 50 for anonymous clients.
const MAX_PAGE: usize = 50;

/// Wikimedia Commons API client.
pub struct WikimediaProvider {
    agent: ureq::Agent,
    config: SearchConfig,
}

impl WikimediaProvider {
    /// Create a provider with its own HTTP agent.
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            agent: http::build_agent(config),
            config: config.clone(),
        }
    }
}

impl ImageProvider for WikimediaProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn search(&self, query: &str, limit: usize) -> Result<Vec<ImageResult>, SearchError> {
        let query = self.config.augmented_query(query);
        tracing::trace!(query = %query, "Wikimedia image search");

        let page_size = limit.clamp(1, MAX_PAGE).to_string();
        let outcome = self
            .agent
            .get(API_URL)
            .query("action", "query")
            .query("format", "json")
            .query("generator", "search")
            .query("gsrsearch", &query)
            .query("gsrnamespace", "6")
            .query("gsrlimit", &page_size)
            .query("prop", "imageinfo")
            .query("iiprop", "url|size")
            .call();
        let body = http::read_body("Wikimedia", outcome)?;

        parse_commons_json(&body, limit)
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    query: Option<QueryBlock>,
}

#[derive(Debug, Deserialize)]
struct QueryBlock {
    #[serde(default)]
    pages: HashMap<String, Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    index: u32,
    #[serde(default)]
    title: String,
    #[serde(default)]
    imageinfo: Vec<ImageInfo>,
}

#[derive(Debug, Deserialize)]
struct ImageInfo {
    url: Option<String>,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
}

/// Parse an API response. Pages come back keyed by id, so they are
/// reordered by the search `index` to keep relevance order.
fn parse_commons_json(body: &str, limit: usize) -> Result<Vec<ImageResult>, SearchError> {
    let response: ApiResponse = serde_json::from_str(body)
        .map_err(|e| SearchError::Parse(format!("Wikimedia JSON: {e}")))?;

    // No `query` block means no hits.
    let Some(block) = response.query else {
        return Ok(Vec::new());
    };

    let mut pages: Vec<Page> = block.pages.into_values().collect();
    pages.sort_by_key(|p| p.index);

    let results: Vec<ImageResult> = pages
        .into_iter()
        .filter_map(|page| {
            let info = page.imageinfo.into_iter().next()?;
            let url = info.url.filter(|u| u.starts_with("http"))?;
            let title = page.title.strip_prefix("File:").unwrap_or(&page.title);
            Some(
                ImageResult::new(url, NAME)
                    .with_title(title)
                    .with_size(info.width, info.height),
            )
        })
        .take(limit)
        .collect();

    tracing::debug!(count = results.len(), "Wikimedia results parsed");
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOCK_COMMONS_JSON: &str = r#"{
        "batchcomplete": "",
        "query": {
            "pages": {
                "9001": {"pageid": 9001, "ns": 6, "title": "File:Blue mug.png", "index": 2,
                         "imageinfo": [{"url": "https://upload.wikimedia.org/b/blue_mug.png", "width": 640, "height": 480}]},
                "42": {"pageid": 42, "ns": 6, "title": "File:Red mug.jpg", "index": 1,
                       "imageinfo": [{"url": "https://upload.wikimedia.org/a/red_mug.jpg", "width": 2000, "height": 1500}]},
                "7": {"pageid": 7, "ns": 6, "title": "File:Broken.svg", "index": 3}
            }
        }
    }"#;

    #[test]
    fn parse_orders_by_search_index() {
        let results = parse_commons_json(MOCK_COMMONS_JSON, 10).expect("should parse");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url, "https://upload.wikimedia.org/a/red_mug.jpg");
        assert_eq!(results[0].title, "Red mug.jpg");
        assert_eq!((results[0].width, results[0].height), (2000, 1500));
        assert_eq!(results[1].source, "wikimedia");
    }

    #[test]
    fn parse_respects_limit() {
        let results = parse_commons_json(MOCK_COMMONS_JSON, 1).expect("should parse");
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn missing_query_block_is_no_hits() {
        let results = parse_commons_json(r#"{"batchcomplete": ""}"#, 10).expect("should parse");
        assert!(results.is_empty());
    }

    #[test]
    fn invalid_json_is_parse_error() {
        let err = parse_commons_json("not json", 10).unwrap_err();
        assert!(matches!(err, SearchError::Parse(_)));
    }

    #[test]
    #[ignore] // Live test: run with `cargo test -- --ignored`
    fn live_wikimedia_search() {
        let provider = WikimediaProvider::new(&SearchConfig::default());
        let results = provider.search("coffee mug", 10).expect("live search");
        assert!(!results.is_empty());
    }
}
