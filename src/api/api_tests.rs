#[cfg(test)]
mod command_surface_tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        Router,
        body::to_bytes,
        http::{Request, StatusCode},
    };
    use serde_json::{Value, json};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::api::{app_state::AppState, create_router};
    use crate::clients::{ContentSource, LogNotifier};
    use crate::config::{CatalogConfig, ResolverConfig, StorageConfig};
    use crate::error::Result;
    use crate::models::Post;
    use crate::observability::ObservabilityState;
    use crate::services::{MatchEngine, PenCatalog, Poller};
    use crate::storage::SeenPostStore;

    struct StaticSource(Vec<Post>);

    #[async_trait]
    impl ContentSource for StaticSource {
        async fn fetch_recent(&self) -> Result<Vec<Post>> {
            Ok(self.0.clone())
        }
    }

    fn test_app() -> (TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageConfig {
            alias_file: dir.path().join("pen_aliases.txt"),
            monitoring_file: dir.path().join("monitoring.txt"),
            seen_posts_db: dir.path().join("seen_posts.db"),
        };
        let (catalog, _) = PenCatalog::open(
            &storage,
            &ResolverConfig::default(),
            &CatalogConfig::default(),
        )
        .unwrap();
        let catalog = Arc::new(catalog);
        let seen = Arc::new(SeenPostStore::open(&storage.seen_posts_db).unwrap());
        let observability = Arc::new(ObservabilityState::new("test".to_string()));

        let source = StaticSource(vec![
            Post::new("p1", "[WTS] Pilot Vanishing Point", "matte black"),
            Post::new("p2", "[WTS] Ink samples", "no pens"),
        ]);
        let poller = Arc::new(Poller::new(
            catalog.clone(),
            MatchEngine::new(seen.clone()),
            Arc::new(source),
            Arc::new(LogNotifier),
            observability.clone(),
        ));

        let state = AppState::new(catalog, seen, poller, observability);
        (dir, create_router(state))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(body.to_string())
                .unwrap(),
            None => builder.body(String::new()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_list_pens_paginates() {
        let (_dir, app) = test_app();

        let (status, body) = send(&app, "GET", "/api/v1/pens?page=1&page_size=2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 10);
        assert_eq!(body["pens"].as_array().unwrap().len(), 2);
        assert_eq!(body["pens"][0]["formal_name"], "Lamy Safari");

        let (status, body) = send(&app, "GET", "/api/v1/pens?page=0", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_create_pen_and_duplicate() {
        let (_dir, app) = test_app();

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/pens",
            Some(json!({"formal_name": "Platinum 3776"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["pen"]["aliases"], json!(["platinum 3776"]));
        assert_eq!(body["total"], 11);

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/pens",
            Some(json!({"formal_name": "PLATINUM 3776", "aliases": ["century"]})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "DUPLICATE_NAME");
    }

    #[tokio::test]
    async fn test_search_pens_ranks_matches() {
        let (_dir, app) = test_app();

        let (status, body) = send(&app, "GET", "/api/v1/pens/search?q=vanshing%20pont&limit=3", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["matches"][0]["formal_name"], "Pilot Vanishing Point");

        let (status, _) = send(&app, "GET", "/api/v1/pens/search", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_alias_routes() {
        let (_dir, app) = test_app();

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/pens/twsbi%20eco/aliases",
            Some(json!({"aliases": ["Eco", "twsbi eco"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["formal_name"], "TWSBI Eco");
        assert_eq!(body["added"], json!(["eco"]));
        assert_eq!(body["already_present"], json!(["twsbi eco"]));

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/pens/twsbi%20eco/aliases/remove",
            Some(json!({"aliases": ["eco", "twsbi eco"]})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "EMPTY_ALIAS_SET");
    }

    #[tokio::test]
    async fn test_delete_unknown_pen_is_404() {
        let (_dir, app) = test_app();

        let (status, body) = send(&app, "DELETE", "/api/v1/pens/nonexistent%20pen%20xyz", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_monitoring_flow() {
        let (_dir, app) = test_app();

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/monitoring",
            Some(json!({"pens": ["vanshing pont", "lamy 2k", "nonexistent pen xyz"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["added"], json!(["Pilot Vanishing Point", "Lamy 2000"]));
        assert_eq!(body["not_found"], json!(["nonexistent pen xyz"]));

        let (_, body) = send(&app, "GET", "/api/v1/monitoring", None).await;
        assert_eq!(body["monitored"], json!(["Pilot Vanishing Point", "Lamy 2000"]));
        let terms = body["search_terms"].as_array().unwrap();
        assert!(terms.contains(&json!("pilot vp")));
        assert!(terms.contains(&json!("l2k")));

        let (status, body) = send(&app, "DELETE", "/api/v1/pens/lamy%202000", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["was_monitored"], true);

        let (_, body) = send(
            &app,
            "POST",
            "/api/v1/monitoring/remove",
            Some(json!({"pens": ["ALL"]})),
        )
        .await;
        assert_eq!(body["removed"], json!(["Pilot Vanishing Point"]));

        let (status, _) = send(&app, "POST", "/api/v1/monitoring", Some(json!({"pens": []}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_poll_force_search_and_seen() {
        let (_dir, app) = test_app();
        send(
            &app,
            "POST",
            "/api/v1/monitoring",
            Some(json!({"pens": ["pilot vanishing point"]})),
        )
        .await;

        let (status, body) = send(&app, "POST", "/api/v1/poll", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fetched"], 2);
        assert_eq!(body["notified"], 1);

        let (_, body) = send(&app, "POST", "/api/v1/poll", None).await;
        assert_eq!(body["matched"], 0);

        let (_, body) = send(&app, "POST", "/api/v1/search/force", None).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["matches"][0]["id"], "p1");
        assert_eq!(body["matches"][0]["url"], "https://www.reddit.com/comments/p1");

        let (_, body) = send(&app, "GET", "/api/v1/seen", None).await;
        assert_eq!(body["count"], 1);

        let (_, body) = send(&app, "DELETE", "/api/v1/seen", None).await;
        assert_eq!(body["forgotten"], 1);
    }

    #[tokio::test]
    async fn test_observability_routes_are_mounted() {
        let (_dir, app) = test_app();

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/health/live").body(String::new()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        send(&app, "GET", "/api/v1/pens", None).await;
        let response = app
            .oneshot(Request::builder().uri("/metrics").body(String::new()).unwrap())
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("penwatch_cycles_total 0"));
        assert!(!text.contains("http_requests_total 0"));
    }
}
