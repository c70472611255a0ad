pub mod client;
pub mod comments;
pub mod config;
pub mod error;
pub mod models;
pub mod offline;
pub mod sanitize;
pub mod stories;
pub mod store;

pub use client::HnClient;
pub use comments::{CommentCache, CommentTreeBuilder};
pub use config::{AppConfig, CommentConfig, FetchConfig, OfflineConfig};
pub use error::{FetchError, StoreError};
pub use models::{
    Comment, Item, OfflineContentType, Preferences, SavedArticle, SortOrder, StoryList,
};
pub use offline::{Captured, OfflineCapturer};
pub use sanitize::{sanitize_document, strip_tags};
pub use stories::{get_stories, get_story_data, get_story_ids};
pub use store::ArticleStore;
