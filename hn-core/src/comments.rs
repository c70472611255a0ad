use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures_util::future::{join_all, BoxFuture};
use futures_util::FutureExt;
use tracing::{debug, warn};

use crate::client::HnClient;
use crate::config::CommentConfig;
use crate::models::Comment;

struct CacheEntry {
    comment: Comment,
    inserted_at: Instant,
}

/// Cache of fully built comment nodes, shared across tree expansions.
///
/// Entries expire after the configured TTL (lazily, on lookup) and can be
/// dropped wholesale with [`CommentCache::clear`]. Inserts are idempotent:
/// a duplicate in-flight fetch for the same ID writes the same node, so
/// concurrent expansions waste work but stay correct.
#[derive(Clone)]
pub struct CommentCache {
    inner: Arc<Mutex<HashMap<u64, CacheEntry>>>,
    ttl: Option<Duration>,
}

impl CommentCache {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    pub fn get(&self, id: u64) -> Option<Comment> {
        let mut guard = self.inner.lock().ok()?;
        if let Some(ttl) = self.ttl {
            let expired = guard
                .get(&id)
                .is_some_and(|entry| entry.inserted_at.elapsed() > ttl);
            if expired {
                guard.remove(&id);
                return None;
            }
        }
        guard.get(&id).map(|entry| entry.comment.clone())
    }

    pub fn insert(&self, comment: Comment) {
        if let Ok(mut guard) = self.inner.lock() {
            guard.insert(
                comment.id,
                CacheEntry {
                    comment,
                    inserted_at: Instant::now(),
                },
            );
        }
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            guard.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Recursively assembles bounded-depth, bounded-fanout comment trees.
///
/// Expansion stops at `max_depth` and fetches at most `limit` children per
/// level (the recursive levels use the smaller `nested_fetch_limit`).
/// Unfetched siblings are reachable later through
/// [`CommentTreeBuilder::load_more_comments`].
pub struct CommentTreeBuilder {
    client: HnClient,
    cache: CommentCache,
    config: CommentConfig,
}

impl CommentTreeBuilder {
    pub fn new(client: HnClient, cache: CommentCache, config: CommentConfig) -> Self {
        Self {
            client,
            cache,
            config,
        }
    }

    pub fn cache(&self) -> &CommentCache {
        &self.cache
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Expand the given root IDs with the configured defaults.
    pub async fn get_comments(&self, kids: &[u64]) -> Vec<Comment> {
        self.get_comments_at(
            kids,
            0,
            self.config.max_depth,
            self.config.initial_fetch_limit,
        )
        .await
    }

    /// Expand comment IDs at an explicit depth with explicit bounds.
    ///
    /// Only the first `limit` IDs are fetched; nodes whose fetch fails are
    /// dropped from the result while the rest of the batch still resolves.
    pub fn get_comments_at<'a>(
        &'a self,
        kids: &'a [u64],
        depth: usize,
        max_depth: usize,
        limit: usize,
    ) -> BoxFuture<'a, Vec<Comment>> {
        async move {
            if kids.is_empty() || depth >= max_depth {
                return Vec::new();
            }

            let batch = &kids[..limit.min(kids.len())];
            let nodes = join_all(
                batch
                    .iter()
                    .map(|id| self.build_node(*id, depth, max_depth)),
            )
            .await;
            nodes.into_iter().flatten().collect()
        }
        .boxed()
    }

    /// Expand the next `limit` sibling IDs starting at `offset` in the full
    /// child ID list, for incremental "load more" pagination.
    pub async fn load_more_comments(
        &self,
        kids: &[u64],
        offset: usize,
        limit: usize,
    ) -> Vec<Comment> {
        if offset >= kids.len() {
            return Vec::new();
        }
        let next_batch = &kids[offset..(offset + limit).min(kids.len())];
        self.get_comments_at(next_batch, 0, self.config.max_depth, limit)
            .await
    }

    async fn build_node(&self, id: u64, depth: usize, max_depth: usize) -> Option<Comment> {
        if let Some(cached) = self.cache.get(id) {
            return Some(cached);
        }

        let item = match self.client.fetch_item(id).await {
            Ok(item) => item,
            Err(err) => {
                warn!(id, error = %err, "dropping unavailable comment");
                return None;
            }
        };
        if item.deleted {
            debug!(id, "skipping deleted comment");
            return None;
        }

        let kid_ids = item.kids.clone();
        let replies = if depth + 1 < max_depth && !kid_ids.is_empty() {
            self.get_comments_at(&kid_ids, depth + 1, max_depth, self.config.nested_fetch_limit)
                .await
        } else {
            Vec::new()
        };

        let comment = Comment::from_item(item, depth, replies);
        self.cache.insert(comment.clone());
        Some(comment)
    }
}
