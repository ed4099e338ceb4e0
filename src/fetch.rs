//! Storybook index fetcher.

use url::Url;

use crate::error::{Error, Result};
use crate::index::StorybookIndex;

/// Fetches and deserializes the configured Storybook index document.
///
/// One GET is issued per logical tool operation; nothing is cached.
#[derive(Debug, Clone)]
pub struct IndexFetcher {
    client: reqwest::Client,
    url: Url,
}

impl IndexFetcher {
    /// Create a fetcher for the given index URL.
    pub fn new(url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }

    /// The configured index URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Fetch the index and select the schema adapter by its discriminator.
    pub async fn fetch(&self) -> Result<StorybookIndex> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| Error::FetchFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::FetchFailed(status.to_string()));
        }

        let document: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::FetchFailed(format!("invalid JSON body: {e}")))?;

        Ok(StorybookIndex::from_value(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_index_is_fetch_failed() {
        // Port 9 (discard) is not listening; the connection is refused
        // without leaving the host.
        let fetcher = IndexFetcher::new(Url::parse("http://127.0.0.1:9/index.json").unwrap());
        match fetcher.fetch().await {
            Err(Error::FetchFailed(_)) => {}
            other => panic!("expected FetchFailed, got {other:?}"),
        }
    }
}
