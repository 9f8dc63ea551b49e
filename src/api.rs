use reqwest::Client;
use tracing::debug;

use crate::MORALIS_API_BASE;
use crate::types::{RawSwap, SwapPage};

/// Thin client for the per-account swaps endpoint.
#[derive(Debug, Clone)]
pub struct SwapsApi {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SwapsApi {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(MORALIS_API_BASE, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Fetch recent swaps for a wallet, newest first.
    ///
    /// Returns the raw records; normalization happens in the engine so a
    /// malformed record never fails the whole fetch.
    pub async fn fetch_swaps(&self, wallet: &str) -> Result<Vec<RawSwap>, reqwest::Error> {
        let url = format!("{}/{}/swaps?order=DESC", self.base_url, wallet);
        let page: SwapPage = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .header("X-API-Key", &self.api_key)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!("Fetched {} swaps for {wallet}", page.result.len());
        Ok(page.result)
    }
}
