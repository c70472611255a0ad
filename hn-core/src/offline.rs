use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use crate::client::map_reqwest_error;
use crate::config::OfflineConfig;
use crate::error::FetchError;
use crate::models::{Item, OfflineContentType, SavedArticle};
use crate::sanitize::sanitize_document;
use crate::store::ArticleStore;

/// A captured offline rendition of an article.
#[derive(Debug, Clone, PartialEq)]
pub struct Captured {
    pub body: String,
    pub content_type: OfflineContentType,
}

/// Best-effort fetch + sanitize of article content for offline reading.
///
/// Capture never raises to its caller: a failed fetch degrades to a short
/// fallback notice naming the original URL, and a save proceeds whether or
/// not capture produced anything useful.
pub struct OfflineCapturer {
    client: Client,
    request_timeout: Duration,
    max_text_length: usize,
}

impl OfflineCapturer {
    pub fn new(config: &OfflineConfig) -> Self {
        Self {
            client: Client::new(),
            request_timeout: config.request_timeout(),
            max_text_length: config.max_text_length,
        }
    }

    /// Capture a renderable offline document for an item.
    ///
    /// Items with an external URL are fetched and sanitized; self-posts
    /// reuse their inline text without touching the network. `None` only
    /// when the item has neither a URL nor self-text.
    pub async fn capture(&self, item: &Item) -> Option<Captured> {
        if let Some(url) = &item.url {
            match self.fetch_and_sanitize(url).await {
                Ok(body) => Some(Captured {
                    body,
                    content_type: OfflineContentType::Html,
                }),
                Err(err) => {
                    warn!(id = item.id, %url, error = %err, "offline capture failed, storing fallback notice");
                    Some(Captured {
                        body: format!(
                            "Offline content is unavailable. Read the original article at {url}"
                        ),
                        content_type: OfflineContentType::Text,
                    })
                }
            }
        } else if let Some(text) = &item.text {
            debug!(id = item.id, "self-post, capturing inline text");
            Some(Captured {
                body: text.clone(),
                content_type: OfflineContentType::Text,
            })
        } else {
            None
        }
    }

    /// Captured document body, or `None` when there is nothing to capture.
    pub async fn fetch_offline_content(&self, item: &Item) -> Option<String> {
        self.capture(item).await.map(|c| c.body)
    }

    /// Save a bookmark with offline content attached up front. Capture is
    /// always attempted before persisting; `is_offline_available` on the
    /// stored record reflects whether it produced non-empty content.
    /// Returns false when the item was already saved.
    pub async fn save_with_offline_content(&self, store: &ArticleStore, item: &Item) -> bool {
        let mut record = SavedArticle::new(item.clone());
        if let Some(captured) = self.capture(item).await {
            record.is_offline_available = !captured.body.is_empty();
            record.offline_content = Some(captured.body);
            record.offline_content_type = Some(captured.content_type);
            record.offline_timestamp = Some(Utc::now());
        }
        store.save_record(record).await
    }

    /// Retroactively attach offline content to an already-saved article.
    /// Idempotent: a record that already has content succeeds without a
    /// refetch. Returns false when the ID is not saved.
    pub async fn add_to_saved_article(&self, store: &ArticleStore, id: u64) -> bool {
        let saved = store.get_saved().await;
        let Some(record) = saved.iter().find(|a| a.id() == id) else {
            warn!(id, "cannot add offline content to an article that is not saved");
            return false;
        };
        if record
            .offline_content
            .as_ref()
            .is_some_and(|c| !c.is_empty())
        {
            debug!(id, "offline content already present");
            return true;
        }

        let Some(captured) = self.capture(&record.item).await else {
            return false;
        };
        store
            .attach_offline_content(id, captured.body, captured.content_type)
            .await
    }

    async fn fetch_and_sanitize(&self, url: &str) -> Result<String, FetchError> {
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
        let html = response.text().await.map_err(map_reqwest_error)?;

        let base = Url::parse(url).ok();
        Ok(sanitize_document(&html, base.as_ref(), self.max_text_length))
    }
}
