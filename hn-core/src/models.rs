use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A story, comment or job posting from the upstream item graph.
///
/// Items are immutable once fetched; everything except `id` is optional
/// because the upstream API omits fields freely. An object without a
/// numeric `id` fails deserialization and is treated as malformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by: Option<String>,
    /// Unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Self-text for self-posts (Ask HN etc), HTML fragment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kids: Vec<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descendants: Option<u32>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deleted: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dead: bool,
}

impl Item {
    /// True for items whose body lives inline rather than behind a URL.
    pub fn is_self_post(&self) -> bool {
        self.url.is_none() && self.text.is_some()
    }

    /// Item time formatted for display in the local style, empty when the
    /// upstream omitted the timestamp.
    pub fn local_time(&self) -> String {
        self.time.map(format_unix_time).unwrap_or_default()
    }
}

/// Format a unix-seconds timestamp like "Mar 4, 2025 18:02".
pub fn format_unix_time(secs: i64) -> String {
    match Utc.timestamp_opt(secs, 0) {
        chrono::LocalResult::Single(dt) => dt.format("%b %-d, %Y %H:%M").to_string(),
        _ => String::new(),
    }
}

/// A comment enriched with its materialized replies and tree depth.
///
/// `depth` is 0 for roots directly under a story and increases by exactly
/// one per level. Nodes at the configured depth cutoff carry no replies
/// regardless of upstream `kids`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    #[serde(default)]
    pub by: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub time: i64,
    #[serde(default)]
    pub score: i64,
    /// Full upstream child ID list, including children that were not
    /// fetched; used by load-more pagination.
    #[serde(default)]
    pub kids: Vec<u64>,
    #[serde(default)]
    pub replies: Vec<Comment>,
    pub depth: usize,
}

impl Comment {
    pub fn from_item(item: Item, depth: usize, replies: Vec<Comment>) -> Self {
        Self {
            id: item.id,
            by: item.by.unwrap_or_default(),
            text: item.text.unwrap_or_default(),
            time: item.time.unwrap_or(0),
            score: item.score.unwrap_or(0),
            kids: item.kids,
            replies,
            depth,
        }
    }
}

/// The six upstream story lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryList {
    Top,
    New,
    Best,
    Ask,
    Show,
    Job,
}

impl StoryList {
    /// Endpoint name under the v0 API, e.g. `topstories`.
    pub fn endpoint(&self) -> &'static str {
        match self {
            StoryList::Top => "topstories",
            StoryList::New => "newstories",
            StoryList::Best => "beststories",
            StoryList::Ask => "askstories",
            StoryList::Show => "showstories",
            StoryList::Job => "jobstories",
        }
    }
}

impl std::fmt::Display for StoryList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.endpoint())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Newest,
    Oldest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfflineContentType {
    Html,
    Text,
}

/// A bookmarked item plus its offline-capture metadata, as persisted by
/// the article store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedArticle {
    #[serde(flatten)]
    pub item: Item,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offline_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offline_content_type: Option<OfflineContentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offline_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_offline_available: bool,
    pub saved_at: DateTime<Utc>,
}

impl SavedArticle {
    pub fn new(item: Item) -> Self {
        Self {
            item,
            offline_content: None,
            offline_content_type: None,
            offline_timestamp: None,
            is_offline_available: false,
            saved_at: Utc::now(),
        }
    }

    pub fn id(&self) -> u64 {
        self.item.id
    }
}

/// User preferences consumed by the app shell. Opaque to the core except
/// that `ArticleStore::clear_all` wipes them along with the bookmarks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub default_list: StoryList,
    pub auto_offline_download: bool,
    pub first_run: bool,
    pub newsletter_subscribed: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            default_list: StoryList::Top,
            auto_offline_download: false,
            first_run: true,
            newsletter_subscribed: false,
        }
    }
}
