//! HTTP Fetcher
//!
//! Fetch adapter used by the server binary: downloads a predicted key from
//! `{origin}/{key}`, with the key escaped as a single path segment.

use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use crate::prediction::DataFetcher;

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    origin: String,
}

impl HttpFetcher {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            origin: origin.into().trim_end_matches('/').to_string(),
        }
    }

    /// URL of `key` under the origin. Reserved characters in the key such
    /// as `?`, `#` and `/` are percent-encoded.
    pub fn url_for(&self, key: &str) -> anyhow::Result<Url> {
        let mut url = Url::parse(&self.origin)?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("origin '{}' cannot carry a path", self.origin))?
            .pop_if_empty()
            .push(key);
        Ok(url)
    }
}

#[async_trait]
impl DataFetcher for HttpFetcher {
    async fn fetch(&self, key: &str) -> anyhow::Result<Vec<u8>> {
        let url = self.url_for(key)?;
        debug!("Fetching {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}
