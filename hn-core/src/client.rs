use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::models::{Item, StoryList};

/// Resilient fetch primitives over the upstream read-only item API.
///
/// Every request is bounded by the configured timeout; transient failures
/// (connect errors, timeouts, non-2xx statuses) are retried with
/// exponential backoff. This layer has no side effects beyond the network
/// call itself and never swallows an exhausted failure.
#[derive(Debug, Clone)]
pub struct HnClient {
    client: Client,
    base_url: String,
    request_timeout: Duration,
    retry_attempts: u32,
    retry_backoff: Duration,
    page_size: usize,
}

impl HnClient {
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            request_timeout: config.request_timeout(),
            retry_attempts: config.retry_attempts.max(1),
            retry_backoff: config.retry_backoff(),
            page_size: config.page_size.max(1),
        }
    }

    /// Point the client at a different API root, e.g. a mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Fetch a single item. The upstream returns a literal `null` body for
    /// IDs that do not exist; that surfaces as [`FetchError::NotFound`] and
    /// is not retried.
    pub async fn fetch_item(&self, id: u64) -> Result<Item, FetchError> {
        let url = format!("{}/item/{}.json", self.base_url, id);
        let body = self.get_with_retries(&url).await?;
        let item: Option<Item> = serde_json::from_str(&body)?;
        item.ok_or(FetchError::NotFound(id))
    }

    /// Fetch the full ordered ID list for a story list.
    pub async fn fetch_id_list(&self, list: StoryList) -> Result<Vec<u64>, FetchError> {
        let url = format!("{}/{}.json", self.base_url, list.endpoint());
        let body = self.get_with_retries(&url).await?;
        let ids: Vec<u64> = serde_json::from_str(&body)?;
        Ok(ids)
    }

    async fn get_with_retries(&self, url: &str) -> Result<String, FetchError> {
        let mut attempt = 0;
        loop {
            match self.get_once(url).await {
                Ok(body) => return Ok(body),
                Err(err) if err.is_transient() && attempt + 1 < self.retry_attempts => {
                    let delay = self.retry_backoff * 2u32.pow(attempt);
                    warn!(%url, error = %err, attempt, delay_ms = delay.as_millis() as u64, "fetch failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    warn!(%url, error = %err, attempts = attempt + 1, "fetch failed");
                    return Err(err);
                }
            }
        }
    }

    async fn get_once(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.text().await.map_err(map_reqwest_error)?;
        debug!(%url, bytes = body.len(), "fetched");
        Ok(body)
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(err)
    }
}
