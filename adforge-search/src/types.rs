//! Core types for image search results.

use serde::{Deserialize, Serialize};

/// A single candidate image found by one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResult {
    /// Direct locator for the image bytes. Primary identity for dedup.
    pub url: String,
    /// Identifier of the provider that found this image.
    pub source: String,
    /// Free-text label, may be empty.
    #[serde(default)]
    pub title: String,
    /// Pixel width, `0` when the provider did not report it.
    #[serde(default)]
    pub width: u32,
    /// Pixel height, `0` when the provider did not report it.
    #[serde(default)]
    pub height: u32,
}

impl ImageResult {
    /// Create a result with unknown dimensions and an empty title.
    pub fn new(url: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            source: source.into(),
            title: String::new(),
            width: 0,
            height: 0,
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the reported dimensions.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_result_has_unknown_dimensions() {
        let result = ImageResult::new("https://img.example/a.jpg", "bing");
        assert_eq!(result.width, 0);
        assert_eq!(result.height, 0);
        assert!(result.title.is_empty());
    }

    #[test]
    fn builder_sets_title_and_size() {
        let result = ImageResult::new("https://img.example/a.jpg", "wikimedia")
            .with_title("Red mug")
            .with_size(800, 600);
        assert_eq!(result.title, "Red mug");
        assert_eq!((result.width, result.height), (800, 600));
    }

    #[test]
    fn deserialize_fills_missing_fields() {
        let json = r#"{"url":"https://img.example/b.png","source":"duckduckgo"}"#;
        let decoded: ImageResult = serde_json::from_str(json).expect("deserialize");
        assert_eq!(decoded.url, "https://img.example/b.png");
        assert_eq!(decoded.width, 0);
        assert!(decoded.title.is_empty());
    }
}
