use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::models::{Item, OfflineContentType, Preferences, SavedArticle, SortOrder};

const ARTICLES_FILE: &str = "articles.json";
const PREFS_FILE: &str = "prefs.json";

/// Persisted bookmark collection plus the app's opaque user preferences.
///
/// Each file is written atomically (temp file + rename) and read back with
/// a temp-file fallback when the main copy is corrupted. Mutating
/// operations hold the write lock across the read-modify-write and the
/// persist, so concurrent saves and removals are serialized and cannot
/// drop each other's writes. Storage failures are logged and surface as
/// safe defaults, never as errors.
#[derive(Clone)]
pub struct ArticleStore {
    articles: Arc<RwLock<Vec<SavedArticle>>>,
    prefs: Arc<RwLock<Preferences>>,
    dir: Option<PathBuf>,
}

impl ArticleStore {
    /// Store that never touches disk; everything is lost on drop.
    pub fn in_memory() -> Self {
        Self {
            articles: Arc::new(RwLock::new(Vec::new())),
            prefs: Arc::new(RwLock::new(Preferences::default())),
            dir: None,
        }
    }

    /// Load persisted state from a data directory, creating it if needed.
    pub async fn load_from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            warn!(error = %e, "failed to create data dir");
        }

        let articles: Vec<SavedArticle> =
            read_json_with_tmp_fallback(&dir.join(ARTICLES_FILE)).await;
        let prefs: Preferences = read_json_with_tmp_fallback(&dir.join(PREFS_FILE)).await;

        Self {
            articles: Arc::new(RwLock::new(articles)),
            prefs: Arc::new(RwLock::new(prefs)),
            dir: Some(dir),
        }
    }

    /// Save an item as a bookmark. Returns true only when the item was
    /// newly saved; an already-saved ID is a no-op returning false, as is
    /// a persistence failure.
    pub async fn save_article(&self, item: &Item) -> bool {
        self.save_record(SavedArticle::new(item.clone())).await
    }

    /// Save a pre-built record (used by the offline capture path).
    pub async fn save_record(&self, record: SavedArticle) -> bool {
        let mut articles = self.articles.write().await;
        if articles.iter().any(|a| a.id() == record.id()) {
            debug!(id = record.id(), "article already saved");
            return false;
        }
        articles.push(record);
        if let Err(e) = self.persist_articles(&articles).await {
            warn!(error = %e, "failed to persist saved articles");
            articles.pop();
            return false;
        }
        true
    }

    /// Remove a bookmark by item ID (idempotent) and return the updated
    /// collection.
    pub async fn remove_article(&self, id: u64) -> Vec<SavedArticle> {
        let mut articles = self.articles.write().await;
        articles.retain(|a| a.id() != id);
        if let Err(e) = self.persist_articles(&articles).await {
            warn!(error = %e, "failed to persist saved articles after removal");
        }
        articles.clone()
    }

    pub async fn get_saved(&self) -> Vec<SavedArticle> {
        self.articles.read().await.clone()
    }

    pub async fn is_saved(&self, id: u64) -> bool {
        self.articles.read().await.iter().any(|a| a.id() == id)
    }

    /// Saved articles filtered by a case-insensitive title substring and
    /// sorted by item timestamp. Never mutates the underlying collection.
    pub async fn get_filtered_saved(&self, sort_order: SortOrder, search_term: &str) -> Vec<SavedArticle> {
        let mut articles = self.articles.read().await.clone();

        let term = search_term.trim().to_lowercase();
        if !term.is_empty() {
            articles.retain(|a| {
                a.item
                    .title
                    .as_deref()
                    .is_some_and(|t| t.to_lowercase().contains(&term))
            });
        }

        articles.sort_by(|a, b| {
            let (ta, tb) = (a.item.time.unwrap_or(0), b.item.time.unwrap_or(0));
            match sort_order {
                SortOrder::Newest => tb.cmp(&ta),
                SortOrder::Oldest => ta.cmp(&tb),
            }
        });
        articles
    }

    /// Attach captured offline content to an already-saved article,
    /// mutating the record in place. Returns false when the ID is not
    /// saved or persistence fails.
    pub async fn attach_offline_content(
        &self,
        id: u64,
        content: String,
        content_type: OfflineContentType,
    ) -> bool {
        let mut articles = self.articles.write().await;
        let Some(pos) = articles.iter().position(|a| a.id() == id) else {
            return false;
        };

        let previous = articles[pos].clone();
        let record = &mut articles[pos];
        record.is_offline_available = !content.is_empty();
        record.offline_content = Some(content);
        record.offline_content_type = Some(content_type);
        record.offline_timestamp = Some(chrono::Utc::now());

        if let Err(e) = self.persist_articles(&articles).await {
            warn!(error = %e, id, "failed to persist offline content");
            articles[pos] = previous;
            return false;
        }
        true
    }

    pub async fn get_offline_content(&self, id: u64) -> Option<String> {
        self.articles
            .read()
            .await
            .iter()
            .find(|a| a.id() == id)
            .and_then(|a| a.offline_content.clone())
    }

    pub async fn is_article_offline_available(&self, id: u64) -> bool {
        self.articles
            .read()
            .await
            .iter()
            .find(|a| a.id() == id)
            .map(|a| a.is_offline_available)
            .unwrap_or(false)
    }

    pub async fn preferences(&self) -> Preferences {
        self.prefs.read().await.clone()
    }

    pub async fn set_preferences(&self, prefs: Preferences) {
        let mut guard = self.prefs.write().await;
        *guard = prefs;
        if let Some(dir) = &self.dir {
            if let Err(e) = persist_json(&dir.join(PREFS_FILE), &*guard).await {
                warn!(error = %e, "failed to persist preferences");
            }
        }
    }

    /// Wipe **all** persisted application state, not just bookmarks:
    /// every file in the data directory is deleted and preferences reset
    /// to defaults. Callers must treat this as a full reset, not a
    /// bookmarks-only clear.
    pub async fn clear_all(&self) {
        let mut articles = self.articles.write().await;
        let mut prefs = self.prefs.write().await;
        articles.clear();
        *prefs = Preferences::default();

        if let Some(dir) = &self.dir {
            match tokio::fs::read_dir(dir).await {
                Ok(mut entries) => {
                    while let Ok(Some(entry)) = entries.next_entry().await {
                        if let Err(e) = tokio::fs::remove_file(entry.path()).await {
                            warn!(error = %e, path = %entry.path().display(), "failed to remove state file");
                        }
                    }
                }
                Err(e) => warn!(error = %e, "failed to enumerate data dir for clear"),
            }
        }
    }

    async fn persist_articles(&self, articles: &[SavedArticle]) -> Result<(), StoreError> {
        match &self.dir {
            Some(dir) => persist_json(&dir.join(ARTICLES_FILE), &articles).await,
            None => {
                debug!("store is in-memory only; skipping persist");
                Ok(())
            }
        }
    }
}

async fn persist_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    if let Some(parent) = path.parent() {
        let _ = tokio::fs::create_dir_all(parent).await;
    }
    // Atomic write: temp file then rename over the target.
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

async fn read_json_with_tmp_fallback<T: DeserializeOwned + Default>(path: &Path) -> T {
    match tokio::fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<T>(&bytes) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, path = %path.display(), "failed to parse JSON, trying tmp fallback");
                let tmp = path.with_extension("json.tmp");
                match tokio::fs::read(&tmp).await {
                    Ok(tmp_bytes) => serde_json::from_slice::<T>(&tmp_bytes).unwrap_or_default(),
                    Err(_) => Default::default(),
                }
            }
        },
        Err(_) => Default::default(),
    }
}
