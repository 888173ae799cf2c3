// Integration tests for the monitoring cycle
//
// Tests cover:
// - Catalog persistence across restarts
// - Full fetch -> filter -> notify cycle against mocked Reddit and Discord
// - Deduplication surviving a restart of the seen-post store

use std::path::Path;
use std::sync::Arc;

use penwatch::clients::{DiscordNotifier, RedditClient};
use penwatch::config::{CatalogConfig, DiscordConfig, RedditConfig, ResolverConfig, StorageConfig};
use penwatch::observability::ObservabilityState;
use penwatch::services::{MatchEngine, PenCatalog, Poller};
use penwatch::storage::SeenPostStore;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn storage(root: &Path) -> StorageConfig {
    StorageConfig {
        alias_file: root.join("pen_aliases.txt"),
        monitoring_file: root.join("monitoring.txt"),
        seen_posts_db: root.join("seen_posts.db"),
    }
}

fn open_catalog(root: &Path) -> PenCatalog {
    let (catalog, _) = PenCatalog::open(
        &storage(root),
        &ResolverConfig::default(),
        &CatalogConfig::default(),
    )
    .unwrap();
    catalog
}

fn listing() -> serde_json::Value {
    json!({
        "data": {
            "children": [
                {"data": {
                    "id": "x1",
                    "title": "[WTS] Pelikan M200 and a Lamy Safari",
                    "selftext": "Both inked once",
                    "permalink": "/r/Pen_Swap/comments/x1/wts/"
                }},
                {"data": {
                    "id": "x2",
                    "title": "[WTS] Sailor Pro Gear Slim",
                    "selftext": "",
                    "permalink": "/r/Pen_Swap/comments/x2/wts/"
                }},
                {"data": {
                    "id": "x3",
                    "title": "[WTS] Vintage Parker 51",
                    "selftext": "Aerometric filler",
                    "permalink": "/r/Pen_Swap/comments/x3/wts/"
                }}
            ]
        }
    })
}

async fn poller(root: &Path, catalog: Arc<PenCatalog>, reddit: &MockServer, discord: &MockServer) -> Poller {
    let source = RedditClient::new(RedditConfig {
        public_api_base: reddit.uri(),
        ..RedditConfig::default()
    })
    .unwrap();
    let notifier = DiscordNotifier::new(DiscordConfig {
        bot_token: "token".to_string(),
        channel_id: "7".to_string(),
        api_base: discord.uri(),
        timeout_secs: 5,
    })
    .unwrap();
    let seen = Arc::new(SeenPostStore::open(storage(root).seen_posts_db).unwrap());

    Poller::new(
        catalog,
        MatchEngine::new(seen),
        Arc::new(source),
        Arc::new(notifier),
        Arc::new(ObservabilityState::new("test".to_string())),
    )
}

#[test]
fn test_catalog_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let catalog = open_catalog(dir.path());
        catalog
            .add_pen("Platinum 3776", &["century".to_string()])
            .unwrap();
        catalog
            .add_monitoring(&["century".to_string(), "m200".to_string()])
            .unwrap();
        catalog
            .add_aliases("platinum 3776", &["3776".to_string()])
            .unwrap();
    }

    let catalog = open_catalog(dir.path());
    assert_eq!(catalog.monitored(), vec!["Platinum 3776", "Pelikan M200"]);
    let terms = catalog.search_terms();
    for term in ["platinum 3776", "century", "3776", "pelikan m200", "m200"] {
        assert!(terms.contains(term), "missing {term}");
    }
    assert_eq!(terms.len(), 5);
}

#[tokio::test]
async fn test_cycle_notifies_each_match_once_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let reddit = MockServer::start().await;
    let discord = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/r/Pen_Swap/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing()))
        .mount(&reddit)
        .await;
    Mock::given(method("POST"))
        .and(path("/channels/7/messages"))
        .and(body_string_contains("Found: lamy safari, m200, pelikan m200, safari"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "m1"})))
        .expect(1)
        .mount(&discord)
        .await;
    Mock::given(method("POST"))
        .and(path("/channels/7/messages"))
        .and(body_string_contains("Found: pro gear, sailor pro gear"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "m2"})))
        .expect(1)
        .mount(&discord)
        .await;

    let catalog = Arc::new(open_catalog(dir.path()));
    catalog
        .add_monitoring(&[
            "pelikan m200".to_string(),
            "lamy safari".to_string(),
            "sailor pro gear".to_string(),
        ])
        .unwrap();

    {
        let poller = poller(dir.path(), catalog.clone(), &reddit, &discord).await;
        let report = poller.run_cycle().await.unwrap();
        assert_eq!(report.fetched, 3);
        assert_eq!(report.matched, 2);
        assert_eq!(report.notified, 2);
        assert_eq!(report.failed, 0);
    }

    // a fresh poller over the same database sees nothing new
    let poller = poller(dir.path(), catalog.clone(), &reddit, &discord).await;
    let report = poller.run_cycle().await.unwrap();
    assert_eq!(report.matched, 0);

    // but a force search still lists both
    let found = poller.force_search().await.unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[1].matched_terms, vec!["pro gear", "sailor pro gear"]);
}

#[tokio::test]
async fn test_removing_a_pen_drops_its_terms_from_the_next_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let reddit = MockServer::start().await;
    let discord = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/r/Pen_Swap/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing()))
        .mount(&reddit)
        .await;
    Mock::given(method("POST"))
        .and(path("/channels/7/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "m"})))
        .expect(0)
        .mount(&discord)
        .await;

    let catalog = Arc::new(open_catalog(dir.path()));
    catalog.add_monitoring(&["sailor pro gear".to_string()]).unwrap();
    let removed = catalog.remove_pen("pro gear").unwrap();
    assert!(removed.was_monitored);

    let poller = poller(dir.path(), catalog.clone(), &reddit, &discord).await;
    let report = poller.run_cycle().await.unwrap();
    assert_eq!(report.fetched, 0);
    assert!(catalog.search_terms().is_empty());
}
