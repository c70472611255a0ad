use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StoreError;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub fetch: FetchConfig,
    pub comments: CommentConfig,
    pub offline: OfflineConfig,
}

/// Remote item client and story pager tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    pub base_url: String,
    pub request_timeout_seconds: u64,
    /// Total attempts per fetch, not retries after the first failure.
    pub retry_attempts: u32,
    /// Base backoff; the delay before attempt `i + 1` is `base * 2^i`.
    pub retry_backoff_ms: u64,
    pub page_size: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://hacker-news.firebaseio.com/v0".to_string(),
            request_timeout_seconds: 5,
            retry_attempts: 3,
            retry_backoff_ms: 1000,
            page_size: 20,
        }
    }
}

impl FetchConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// Comment tree breadth/depth caps and cache bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentConfig {
    pub max_depth: usize,
    /// Breadth cap for top-level expansion.
    pub initial_fetch_limit: usize,
    /// Smaller breadth cap used by recursive reply expansion.
    pub nested_fetch_limit: usize,
    /// Cached nodes older than this are refetched; 0 disables expiry.
    pub cache_ttl_seconds: u64,
}

impl Default for CommentConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            initial_fetch_limit: 10,
            nested_fetch_limit: 3,
            cache_ttl_seconds: 300,
        }
    }
}

impl CommentConfig {
    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl_seconds > 0).then(|| Duration::from_secs(self.cache_ttl_seconds))
    }
}

/// Offline content capture tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfflineConfig {
    pub request_timeout_seconds: u64,
    /// Cap on the plain-text fallback rendition, in characters.
    pub max_text_length: usize,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: 10,
            max_text_length: 5000,
        }
    }
}

impl OfflineConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl AppConfig {
    pub fn config_file_path() -> Result<PathBuf, StoreError> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "no user config directory")
        })?;
        let app_config_dir = config_dir.join("hn-reader");
        std::fs::create_dir_all(&app_config_dir)?;
        Ok(app_config_dir.join("config.json"))
    }

    /// Load the configuration file, falling back to defaults (and writing
    /// them out) when it is missing or unreadable.
    pub fn load() -> Self {
        match Self::load_from_file() {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "could not load config, using defaults");
                let default_config = Self::default();
                if let Err(save_err) = default_config.save() {
                    warn!(error = %save_err, "could not write default config");
                }
                default_config
            }
        }
    }

    fn load_from_file() -> Result<Self, StoreError> {
        let config_path = Self::config_file_path()?;
        let config_content = std::fs::read_to_string(config_path)?;
        let config: AppConfig = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), StoreError> {
        let config_path = Self::config_file_path()?;
        let config_json = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, config_json)?;
        Ok(())
    }
}
