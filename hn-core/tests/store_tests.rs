use std::path::PathBuf;

use hn_core::{ArticleStore, Item, OfflineContentType, SavedArticle, SortOrder, StoryList};

fn unique_dir(tag: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!(
        "hn_core_{}_{}",
        tag,
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    dir
}

fn story(id: u64, title: &str, time: i64) -> Item {
    Item {
        id,
        kind: Some("story".to_string()),
        by: Some("tester".to_string()),
        time: Some(time),
        score: Some(10),
        title: Some(title.to_string()),
        text: None,
        url: Some(format!("https://example.com/{id}")),
        kids: Vec::new(),
        descendants: None,
        deleted: false,
        dead: false,
    }
}

#[tokio::test]
async fn saving_the_same_id_twice_keeps_one_record() {
    let store = ArticleStore::in_memory();
    assert!(store.save_article(&story(1, "One", 100)).await);
    assert!(!store.save_article(&story(1, "One again", 200)).await);
    assert_eq!(store.get_saved().await.len(), 1);
    assert!(store.is_saved(1).await);
}

#[tokio::test]
async fn removal_returns_the_updated_collection() {
    let dir = unique_dir("remove");
    let store = ArticleStore::load_from_dir(&dir).await;
    for (id, title) in [(1, "a"), (2, "b"), (3, "c")] {
        store.save_article(&story(id, title, id as i64)).await;
    }

    let remaining = store.remove_article(2).await;
    let ids: Vec<u64> = remaining.iter().map(|a| a.id()).collect();
    assert_eq!(ids, vec![1, 3]);

    let saved: Vec<u64> = store.get_saved().await.iter().map(|a| a.id()).collect();
    assert_eq!(saved, vec![1, 3]);

    // removing again is a no-op
    assert_eq!(store.remove_article(2).await.len(), 2);

    let _ = tokio::fs::remove_dir_all(&dir).await;
}

#[tokio::test]
async fn filtering_matches_titles_case_insensitively() {
    let store = ArticleStore::in_memory();
    store.save_article(&story(1, "Rust 1.80 released", 300)).await;
    store.save_article(&story(2, "Go generics", 100)).await;
    store.save_article(&story(3, "Why I love rust", 200)).await;

    let hits = store.get_filtered_saved(SortOrder::Newest, "RUST").await;
    let ids: Vec<u64> = hits.iter().map(|a| a.id()).collect();
    assert_eq!(ids, vec![1, 3]);

    // filtering never mutates the store
    assert_eq!(store.get_saved().await.len(), 3);
}

#[tokio::test]
async fn sorting_orders_by_item_time() {
    let store = ArticleStore::in_memory();
    store.save_article(&story(1, "first", 100)).await;
    store.save_article(&story(2, "second", 300)).await;
    store.save_article(&story(3, "third", 200)).await;

    let newest = store.get_filtered_saved(SortOrder::Newest, "").await;
    let ids: Vec<u64> = newest.iter().map(|a| a.id()).collect();
    assert_eq!(ids, vec![2, 3, 1]);

    let oldest = store.get_filtered_saved(SortOrder::Oldest, "").await;
    let ids: Vec<u64> = oldest.iter().map(|a| a.id()).collect();
    assert_eq!(ids, vec![1, 3, 2]);
}

#[tokio::test]
async fn saved_articles_survive_a_reload() {
    let dir = unique_dir("reload");
    let store = ArticleStore::load_from_dir(&dir).await;
    store.save_article(&story(1, "persisted", 100)).await;
    drop(store);

    let reopened = ArticleStore::load_from_dir(&dir).await;
    let saved = reopened.get_saved().await;
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].item.title.as_deref(), Some("persisted"));

    let _ = tokio::fs::remove_dir_all(&dir).await;
}

#[tokio::test]
async fn corrupted_articles_file_falls_back_to_tmp() {
    let dir = unique_dir("corrupt");
    tokio::fs::create_dir_all(&dir).await.unwrap();

    tokio::fs::write(dir.join("articles.json"), b"{ this is not json ")
        .await
        .unwrap();
    let records = vec![SavedArticle::new(story(1, "rescued", 100))];
    let bytes = serde_json::to_vec(&records).unwrap();
    tokio::fs::write(dir.join("articles.json.tmp"), bytes)
        .await
        .unwrap();

    let store = ArticleStore::load_from_dir(&dir).await;
    let saved = store.get_saved().await;
    assert_eq!(saved.len(), 1, "should fall back to tmp file when main is corrupted");
    assert_eq!(saved[0].id(), 1);

    let _ = tokio::fs::remove_dir_all(&dir).await;
}

#[tokio::test]
async fn offline_content_can_be_attached_and_read_back() {
    let store = ArticleStore::in_memory();
    store.save_article(&story(1, "offline", 100)).await;

    assert!(!store.is_article_offline_available(1).await);
    assert!(
        store
            .attach_offline_content(1, "<p>cached</p>".to_string(), OfflineContentType::Html)
            .await
    );
    assert!(store.is_article_offline_available(1).await);
    assert_eq!(
        store.get_offline_content(1).await.as_deref(),
        Some("<p>cached</p>")
    );

    // attaching to an unknown id fails
    assert!(
        !store
            .attach_offline_content(99, "x".to_string(), OfflineContentType::Text)
            .await
    );
    assert!(store.get_offline_content(99).await.is_none());
}

#[tokio::test]
async fn clear_all_wipes_bookmarks_and_preferences() {
    let dir = unique_dir("clear");
    let store = ArticleStore::load_from_dir(&dir).await;
    store.save_article(&story(1, "doomed", 100)).await;

    let mut prefs = store.preferences().await;
    prefs.auto_offline_download = true;
    prefs.default_list = StoryList::Ask;
    prefs.first_run = false;
    store.set_preferences(prefs).await;

    store.clear_all().await;

    assert!(store.get_saved().await.is_empty());
    let prefs = store.preferences().await;
    assert!(!prefs.auto_offline_download);
    assert_eq!(prefs.default_list, StoryList::Top);
    assert!(prefs.first_run);

    // nothing comes back after a reload either
    let reopened = ArticleStore::load_from_dir(&dir).await;
    assert!(reopened.get_saved().await.is_empty());
    assert!(!reopened.preferences().await.auto_offline_download);

    let _ = tokio::fs::remove_dir_all(&dir).await;
}

#[tokio::test]
async fn concurrent_saves_are_not_lost() {
    let dir = unique_dir("race");
    let store = ArticleStore::load_from_dir(&dir).await;

    let mut handles = Vec::new();
    for id in 1..=10u64 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.save_article(&story(id, "racer", id as i64)).await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap());
    }
    assert_eq!(store.get_saved().await.len(), 10);

    let reopened = ArticleStore::load_from_dir(&dir).await;
    assert_eq!(reopened.get_saved().await.len(), 10);

    let _ = tokio::fs::remove_dir_all(&dir).await;
}
