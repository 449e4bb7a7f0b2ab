//! URL metadata resolution
//!
//! Resolves a URL to its title, description and preview image.
//!
//! - [`HtmlMetadataFetcher`]: fetches the page and reads its meta tags
//! - [`RemoteMetadataFetcher`]: asks an external metadata service

mod html;
mod remote;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use html::HtmlMetadataFetcher;
pub use remote::RemoteMetadataFetcher;

/// Metadata extracted from a URL
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UrlMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Errors that can occur while fetching metadata
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Metadata request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Metadata request returned status {0}")]
    Status(u16),

    #[error("Invalid URL '{0}'")]
    InvalidUrl(String),

    #[error("Failed to decode metadata: {0}")]
    Decode(String),
}

/// Resolves URLs to [`UrlMetadata`]
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<UrlMetadata, MetadataError>;
}
