use crate::error::{EmbedError, Result};
use crate::source::Fetcher;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// `GET` over HTTP(S); non-2xx responses are failures
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("code-embed/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EmbedError::fetch("<client>", e))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| EmbedError::fetch(url, e))?
            .error_for_status()
            .map_err(|e| EmbedError::fetch(url, e))?;

        let text = response.text().await.map_err(|e| {
            log::warn!("failed while reading HTTP body from {url}: {e}");
            EmbedError::fetch(url, e)
        })?;
        log::debug!("fetched {} bytes from {url}", text.len());
        Ok(text)
    }
}
