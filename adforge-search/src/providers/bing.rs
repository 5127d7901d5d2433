//! Bing Images scraper.
//!
//! Each result tile on the Bing Images page is an `a.iusc` anchor whose `m`
//! attribute carries a JSON blob with the full-size image URL (`murl`) and
//! the page title (`t`).

use scraper::{Html, Selector};
use serde::Deserialize;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::http;
use crate::provider::ImageProvider;
use crate::types::ImageResult;

/// Identifier used in configuration.
pub const NAME: &str = "bing";

const SEARCH_URL: &str = "https://www.bing.com/images/search";

/// Bing Images HTML scraper.
pub struct BingProvider {
    agent: ureq::Agent,
    config: SearchConfig,
}

impl BingProvider {
    /// Create a provider with its own HTTP agent.
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            agent: http::build_agent(config),
            config: config.clone(),
        }
    }
}

impl ImageProvider for BingProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn search(&self, query: &str, limit: usize) -> Result<Vec<ImageResult>, SearchError> {
        let query = self.config.augmented_query(query);
        tracing::trace!(query = %query, "Bing image search");

        let count = limit.min(150).to_string();
        let outcome = self
            .agent
            .get(SEARCH_URL)
            .query("q", &query)
            .query("form", "HDRSC2")
            .query("first", "1")
            .query("count", &count)
            .set("Accept", "text/html,application/xhtml+xml")
            .set("Accept-Language", "en-US,en;q=0.9")
            .call();
        let html = http::read_body("Bing", outcome)?;

        tracing::trace!(bytes = html.len(), "Bing response received");
        parse_bing_html(&html, limit)
    }
}

/// Metadata embedded in each tile's `m` attribute.
#[derive(Debug, Deserialize)]
struct TileMeta {
    murl: Option<String>,
    #[serde(default)]
    t: String,
}

/// Parse a Bing Images results page.
fn parse_bing_html(html: &str, limit: usize) -> Result<Vec<ImageResult>, SearchError> {
    let document = Html::parse_document(html);
    let tile_sel = Selector::parse("a.iusc")
        .map_err(|e| SearchError::Parse(format!("invalid tile selector: {e:?}")))?;

    let mut results = Vec::new();
    for tile in document.select(&tile_sel) {
        let Some(raw) = tile.value().attr("m") else {
            continue;
        };
        let meta: TileMeta = match serde_json::from_str(raw) {
            Ok(meta) => meta,
            Err(e) => {
                tracing::trace!(error = %e, "skipping malformed Bing tile");
                continue;
            }
        };
        let url = match meta.murl {
            Some(u) if u.starts_with("http") => u,
            _ => continue,
        };
        results.push(ImageResult::new(url, NAME).with_title(meta.t.trim()));

        if results.len() >= limit {
            break;
        }
    }

    tracing::debug!(count = results.len(), "Bing results parsed");
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOCK_BING_HTML: &str = r#"<!DOCTYPE html>
<html><body>
<ul class="dgControl_list">
<li><div class="iuscp"><a class="iusc" m='{"murl":"https://cdn.example.com/mug-red.jpg","t":"Red ceramic mug"}' href="/images/1"></a></div></li>
<li><div class="iuscp"><a class="iusc" m='not json' href="/images/2"></a></div></li>
<li><div class="iuscp"><a class="iusc" m='{"t":"No url here"}' href="/images/3"></a></div></li>
<li><div class="iuscp"><a class="iusc" m='{"murl":"https://cdn.example.com/mug-blue.png","t":" Blue mug "}' href="/images/4"></a></div></li>
<li><div class="iuscp"><a class="iusc" m='{"murl":"https://cdn.example.com/mug-green.webp"}' href="/images/5"></a></div></li>
</ul>
</body></html>"#;

    #[test]
    fn parse_mock_html_returns_results() {
        let results = parse_bing_html(MOCK_BING_HTML, 10).expect("should parse");
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].url, "https://cdn.example.com/mug-red.jpg");
        assert_eq!(results[0].title, "Red ceramic mug");
        assert_eq!(results[0].source, "bing");
        assert_eq!(results[1].title, "Blue mug");
        assert!(results[2].title.is_empty());
        assert_eq!(results[2].width, 0);
    }

    #[test]
    fn parse_respects_limit() {
        let results = parse_bing_html(MOCK_BING_HTML, 2).expect("should parse");
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn parse_empty_html_returns_empty() {
        let results = parse_bing_html("<html><body></body></html>", 10).expect("should parse");
        assert!(results.is_empty());
    }

    #[test]
    fn is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BingProvider>();
    }

    #[test]
    #[ignore] // Live test: run with `cargo test -- --ignored`
    fn live_bing_search() {
        let provider = BingProvider::new(&SearchConfig::default());
        let results = provider.search("red ceramic mug", 10).expect("live search");
        assert!(!results.is_empty());
    }
}
