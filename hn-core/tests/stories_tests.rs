use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hn_core::{get_stories, get_story_data, get_story_ids, FetchConfig, HnClient, StoryList};

fn test_client(base_url: &str, retry_attempts: u32) -> HnClient {
    let cfg = FetchConfig {
        base_url: base_url.to_string(),
        request_timeout_seconds: 2,
        retry_attempts,
        retry_backoff_ms: 10,
        page_size: 20,
    };
    HnClient::new(&cfg)
}

fn item_body(id: u64) -> String {
    format!(r#"{{"id":{id},"type":"story","title":"Story {id}","time":{}}}"#, 1700000000 + id)
}

async fn mount_id_list(server: &MockServer, list: &str, ids: &[u64]) {
    let body = serde_json::to_string(ids).unwrap();
    Mock::given(method("GET"))
        .and(path(format!("/{list}.json")))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_item(server: &MockServer, id: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/item/{id}.json")))
        .respond_with(ResponseTemplate::new(200).set_body_string(item_body(id)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn pages_slice_the_upstream_list_deterministically() {
    let server = MockServer::start().await;
    let all_ids: Vec<u64> = (100..150).collect();
    mount_id_list(&server, "topstories", &all_ids).await;

    let client = test_client(&server.uri(), 3);

    let page1 = get_story_ids(&client, StoryList::Top, 1).await.unwrap();
    let page2 = get_story_ids(&client, StoryList::Top, 2).await.unwrap();
    let page3 = get_story_ids(&client, StoryList::Top, 3).await.unwrap();
    let page4 = get_story_ids(&client, StoryList::Top, 4).await.unwrap();

    assert_eq!(page1, all_ids[0..20].to_vec());
    assert_eq!(page2, all_ids[20..40].to_vec());
    assert_eq!(page3, all_ids[40..50].to_vec());
    assert!(page4.is_empty());

    // pages 1..3 concatenated cover the whole list exactly once
    let mut joined = page1;
    joined.extend(page2);
    joined.extend(page3);
    assert_eq!(joined, all_ids);
}

#[tokio::test]
async fn stories_are_deduplicated_and_failed_items_dropped() {
    let server = MockServer::start().await;
    mount_id_list(&server, "newstories", &[1, 1, 2, 3]).await;
    Mock::given(method("GET"))
        .and(path("/item/1.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(item_body(1)))
        .expect(1)
        .mount(&server)
        .await;
    mount_item(&server, 2).await;
    Mock::given(method("GET"))
        .and(path("/item/3.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 1);
    let stories = get_stories(&client, StoryList::New, 1).await;

    let ids: Vec<u64> = stories.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[tokio::test]
async fn id_list_failure_yields_empty_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/beststories.json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 1);
    let stories = get_stories(&client, StoryList::Best, 1).await;
    assert!(stories.is_empty());
}

#[tokio::test]
async fn unavailable_story_maps_to_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/item/5.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 1);
    assert!(get_story_data(&client, 5).await.is_none());
}

#[tokio::test]
async fn malformed_item_is_filtered_out() {
    let server = MockServer::start().await;
    mount_id_list(&server, "askstories", &[1, 2]).await;
    mount_item(&server, 1).await;
    // no numeric id: fails deserialization, treated as absence
    Mock::given(method("GET"))
        .and(path("/item/2.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"title":"no id"}"#))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 1);
    let stories = get_stories(&client, StoryList::Ask, 1).await;
    assert_eq!(stories.len(), 1);
    assert_eq!(stories[0].id, 1);
}
