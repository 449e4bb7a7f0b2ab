//! Metadata from an external metadata service
//!
//! The service is called as `GET {endpoint}?url=<url>` and answers with
//! `{"title": ..., "description": ..., "image": ...}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use super::{MetadataError, MetadataFetcher, UrlMetadata};

#[derive(Debug, Clone)]
pub struct RemoteMetadataFetcher {
    client: reqwest::Client,
    endpoint: Url,
}

impl RemoteMetadataFetcher {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, MetadataError> {
        let endpoint =
            Url::parse(endpoint).map_err(|_| MetadataError::InvalidUrl(endpoint.to_string()))?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn request_url(&self, url: &str) -> Url {
        let mut request = self.endpoint.clone();
        request.query_pairs_mut().append_pair("url", url);
        request
    }
}

#[async_trait]
impl MetadataFetcher for RemoteMetadataFetcher {
    async fn fetch(&self, url: &str) -> Result<UrlMetadata, MetadataError> {
        let request = self.request_url(url);
        debug!("Requesting metadata for {} from {}", url, self.endpoint);

        let response = self.client.get(request).send().await?;
        if !response.status().is_success() {
            return Err(MetadataError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        let metadata: UrlMetadata =
            serde_json::from_str(&body).map_err(|e| MetadataError::Decode(e.to_string()))?;
        Ok(normalize(metadata))
    }
}

/// Treat blank strings from the service as missing
fn normalize(metadata: UrlMetadata) -> UrlMetadata {
    let clean = |value: Option<String>| {
        value
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };
    UrlMetadata {
        title: clean(metadata.title),
        description: clean(metadata.description),
        image: clean(metadata.image),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_url_encodes_target() {
        let fetcher =
            RemoteMetadataFetcher::new("https://meta.example.com/api/fetch", Duration::from_secs(5))
                .unwrap();
        let url = fetcher.request_url("https://site.com/a?b=c&d=e");
        assert_eq!(
            url.as_str(),
            "https://meta.example.com/api/fetch?url=https%3A%2F%2Fsite.com%2Fa%3Fb%3Dc%26d%3De"
        );
    }

    #[test]
    fn test_invalid_endpoint() {
        let err = RemoteMetadataFetcher::new("::nope::", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, MetadataError::InvalidUrl(_)));
    }

    #[test]
    fn test_normalize_drops_blank_values() {
        let metadata: UrlMetadata =
            serde_json::from_str(r#"{"title":" Example ","description":"","image":null}"#).unwrap();
        let metadata = normalize(metadata);
        assert_eq!(metadata.title, Some("Example".to_string()));
        assert!(metadata.description.is_none());
        assert!(metadata.image.is_none());
    }

    #[test]
    fn test_missing_keys_decode_as_none() {
        let metadata: UrlMetadata = serde_json::from_str(r#"{"title":"Only"}"#).unwrap();
        assert_eq!(metadata.title.as_deref(), Some("Only"));
        assert!(metadata.image.is_none());
    }
}
