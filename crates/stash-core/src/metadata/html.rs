//! Metadata scraped from the page itself

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use scraper::{Html, Selector};
use tracing::debug;

use super::{MetadataError, MetadataFetcher, UrlMetadata};

/// Default fetch timeout in seconds
const FETCH_TIMEOUT: u64 = 10;

const USER_AGENT: &str = concat!("Mozilla/5.0 (compatible; stash/", env!("CARGO_PKG_VERSION"), ")");

/// Fetches a page and reads Open Graph, Twitter card and plain HTML tags
#[derive(Debug, Clone)]
pub struct HtmlMetadataFetcher {
    client: reqwest::Client,
}

impl HtmlMetadataFetcher {
    pub fn new() -> Result<Self, MetadataError> {
        Self::with_timeout(Duration::from_secs(FETCH_TIMEOUT))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, MetadataError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl MetadataFetcher for HtmlMetadataFetcher {
    async fn fetch(&self, url: &str) -> Result<UrlMetadata, MetadataError> {
        let page_url = Url::parse(url).map_err(|_| MetadataError::InvalidUrl(url.to_string()))?;
        debug!("Fetching metadata from {}", page_url);

        let response = self.client.get(page_url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(MetadataError::Status(response.status().as_u16()));
        }

        // Redirects may move relative image paths
        let final_url = response.url().clone();
        let html = response.text().await?;
        Ok(parse_metadata(&html, &final_url))
    }
}

/// Parse metadata from HTML content
fn parse_metadata(html: &str, base: &Url) -> UrlMetadata {
    let document = Html::parse_document(html);

    UrlMetadata {
        title: extract_title(&document),
        description: extract_description(&document),
        image: extract_image(&document, base),
    }
}

fn extract_title(document: &Html) -> Option<String> {
    extract_meta_content(document, "og:title")
        .or_else(|| extract_meta_content(document, "twitter:title"))
        .or_else(|| {
            let selector = Selector::parse("title").ok()?;
            document
                .select(&selector)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

fn extract_description(document: &Html) -> Option<String> {
    extract_meta_content(document, "og:description")
        .or_else(|| extract_meta_content(document, "twitter:description"))
        .or_else(|| extract_meta_content(document, "description"))
}

/// Preview image, resolved against the page URL
fn extract_image(document: &Html, base: &Url) -> Option<String> {
    let raw = extract_meta_content(document, "og:image")
        .or_else(|| extract_meta_content(document, "og:image:url"))
        .or_else(|| extract_meta_content(document, "twitter:image"))
        .or_else(|| {
            let selector = Selector::parse(r#"link[rel="image_src"]"#).ok()?;
            document
                .select(&selector)
                .next()
                .and_then(|el| el.value().attr("href"))
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })?;

    match base.join(&raw) {
        Ok(resolved) => Some(resolved.to_string()),
        Err(_) => Some(raw),
    }
}

/// Extract content from a meta tag by property or name
fn extract_meta_content(document: &Html, property: &str) -> Option<String> {
    for attr in ["property", "name"] {
        let selector = match Selector::parse(&format!(r#"meta[{}="{}"]"#, attr, property)) {
            Ok(s) => s,
            Err(_) => continue,
        };
        let content = document
            .select(&selector)
            .filter_map(|el| el.value().attr("content"))
            .map(str::trim)
            .find(|c| !c.is_empty());
        if let Some(content) = content {
            return Some(content.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/articles/one").unwrap()
    }

    #[test]
    fn test_parse_metadata_basic() {
        let html = r#"
            <!DOCTYPE html>
            <html>
            <head>
                <title>Test Page</title>
                <meta name="description" content="A test description">
            </head>
            <body></body>
            </html>
        "#;

        let metadata = parse_metadata(html, &base());
        assert_eq!(metadata.title, Some("Test Page".to_string()));
        assert_eq!(metadata.description, Some("A test description".to_string()));
        assert!(metadata.image.is_none());
    }

    #[test]
    fn test_parse_metadata_opengraph() {
        let html = r#"
            <html>
            <head>
                <title>Fallback Title</title>
                <meta property="og:title" content="OG Title">
                <meta property="og:description" content="OG Description">
                <meta property="og:image" content="https://cdn.example.com/card.png">
            </head>
            </html>
        "#;

        let metadata = parse_metadata(html, &base());
        // OG takes precedence
        assert_eq!(metadata.title, Some("OG Title".to_string()));
        assert_eq!(metadata.description, Some("OG Description".to_string()));
        assert_eq!(
            metadata.image,
            Some("https://cdn.example.com/card.png".to_string())
        );
    }

    #[test]
    fn test_twitter_card_fallback() {
        let html = r#"
            <html><head>
                <meta name="twitter:title" content="Tweet Title">
                <meta name="twitter:image" content="/img/tw.jpg">
            </head></html>
        "#;

        let metadata = parse_metadata(html, &base());
        assert_eq!(metadata.title, Some("Tweet Title".to_string()));
        assert_eq!(
            metadata.image,
            Some("https://example.com/img/tw.jpg".to_string())
        );
    }

    #[test]
    fn test_relative_image_resolution() {
        let html = r#"<html><head><link rel="image_src" href="thumb.png"></head></html>"#;
        let metadata = parse_metadata(html, &base());
        assert_eq!(
            metadata.image,
            Some("https://example.com/articles/thumb.png".to_string())
        );
    }

    #[test]
    fn test_parse_metadata_empty() {
        let html = "<html><head><title>   </title></head><body></body></html>";
        let metadata = parse_metadata(html, &base());
        assert_eq!(metadata, UrlMetadata::default());
    }

    #[tokio::test]
    async fn test_fetch_rejects_invalid_url() {
        let fetcher = HtmlMetadataFetcher::new().unwrap();
        let err = fetcher.fetch("not a url").await.unwrap_err();
        assert!(matches!(err, MetadataError::InvalidUrl(_)));
    }
}
