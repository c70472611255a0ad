use std::collections::HashSet;

use futures_util::future::join_all;
use tracing::warn;

use crate::client::HnClient;
use crate::error::FetchError;
use crate::models::{Item, StoryList};

/// IDs for one page of a story list.
///
/// Pagination is computed client-side over the freshly fetched ID list:
/// page `n` (1-based) covers upstream indices `[(n-1)*P, n*P)`. There is
/// no server-side cursor, so pages are only as stable as the upstream
/// ordering between calls.
pub async fn get_story_ids(
    client: &HnClient,
    list: StoryList,
    page: usize,
) -> Result<Vec<u64>, FetchError> {
    let all_ids = client.fetch_id_list(list).await?;

    let page_size = client.page_size();
    let start = page.max(1).saturating_sub(1) * page_size;
    if start >= all_ids.len() {
        return Ok(Vec::new());
    }
    let end = (start + page_size).min(all_ids.len());
    Ok(all_ids[start..end].to_vec())
}

/// Fetch one item, mapping any irrecoverable failure to `None`. Callers
/// treat `None` as "item unavailable, skip it".
pub async fn get_story_data(client: &HnClient, id: u64) -> Option<Item> {
    match client.fetch_item(id).await {
        Ok(item) => Some(item),
        Err(err) => {
            warn!(id, error = %err, "dropping unavailable story");
            None
        }
    }
}

/// Fully populated items for one page of a story list.
///
/// IDs within the slice are deduplicated before fetching, item bodies are
/// fetched concurrently, and unavailable or malformed items are dropped.
/// A failure to fetch the ID list itself yields an empty page.
pub async fn get_stories(client: &HnClient, list: StoryList, page: usize) -> Vec<Item> {
    let ids = match get_story_ids(client, list, page).await {
        Ok(ids) => ids,
        Err(err) => {
            warn!(%list, page, error = %err, "could not fetch story ids");
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let unique_ids: Vec<u64> = ids.into_iter().filter(|id| seen.insert(*id)).collect();

    let fetches = unique_ids.iter().map(|id| get_story_data(client, *id));
    join_all(fetches).await.into_iter().flatten().collect()
}
