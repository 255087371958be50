//! Integration tests for the finance assistant
//!
//! These tests cover the full workflow from configuration loading through
//! catalog persistence, and the news flow from provider to rendered page.

use std::io::Write;
use tempfile::NamedTempFile;

mod common {
    use tempfile::TempDir;

    /// Create a temporary directory for test databases
    pub fn create_temp_dir() -> TempDir {
        tempfile::tempdir().expect("Failed to create temp directory")
    }

    /// Create a test database path
    pub fn create_db_path(temp_dir: &TempDir) -> String {
        let db_path = temp_dir.path().join("test.db");
        format!("sqlite:{}?mode=rwc", db_path.display())
    }
}

#[cfg(test)]
mod config_integration_tests {
    use super::*;
    use finance_assistant::config::Config;

    #[test]
    fn test_load_shipped_config() {
        let config = Config::load("finance.toml");
        assert!(config.is_ok(), "Failed to load finance.toml: {:?}", config.err());

        let config = config.unwrap();
        assert!(!config.modules.is_empty(), "finance.toml should seed at least one module");
        assert_eq!(config.news.language, "en");
    }

    #[test]
    fn test_config_from_file() {
        let toml_content = r#"
            [news]
            endpoint = "http://127.0.0.1:1/v2/everything"

            [[modules]]
            id = "sip"
            title = "SIPs"
            description = "Regular investing"

            [[modules.videos]]
            id = "sip-1"
            title = "Intro"
            youtube_url = "https://www.youtube.com/embed/one"

            [[modules.videos]]
            id = "sip-2"
            title = "Compounding"
            youtube_url = "https://www.youtube.com/embed/two"
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.server.bind, "0.0.0.0:3000");
        assert_eq!(config.news.endpoint, "http://127.0.0.1:1/v2/everything");
        assert_eq!(config.modules.len(), 1);
        assert_eq!(config.modules[0].videos.len(), 2);
        assert_eq!(config.modules[0].videos[1].title, "Compounding");
    }
}

#[cfg(test)]
mod database_integration_tests {
    use super::common::*;
    use finance_assistant::config::Config;
    use finance_assistant::db::Database;

    const CATALOG: &str = r#"
        [[modules]]
        id = "sip"
        title = "Systematic Investment Plans"
        description = "Regular investing"

        [[modules.videos]]
        id = "sip-1"
        title = "Intro"
        youtube_url = "https://www.youtube.com/embed/one"

        [[modules]]
        id = "trading"
        title = "Stock Trading"
        description = "Market basics"
    "#;

    #[tokio::test]
    async fn test_config_to_database_workflow() {
        let temp_dir = create_temp_dir();
        let db_url = create_db_path(&temp_dir);

        let config = Config::from_str(CATALOG).unwrap();

        let db = Database::new(&db_url).await.unwrap();
        db.initialize().await.unwrap();
        db.sync_catalog(&config.modules).await.unwrap();

        let modules = db.get_all_modules().await.unwrap();
        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0].id, "sip");
        assert_eq!(modules[1].id, "trading");

        let videos = db.get_videos_for_module("sip").await.unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].youtube_url, "https://www.youtube.com/embed/one");
        assert!(db.get_videos_for_module("trading").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_database_persistence() {
        let temp_dir = create_temp_dir();
        let db_url = create_db_path(&temp_dir);

        {
            let db = Database::new(&db_url).await.unwrap();
            db.initialize().await.unwrap();
            let config = Config::from_str(CATALOG).unwrap();
            db.sync_catalog(&config.modules).await.unwrap();
        }

        // Reopen database and verify data persists
        {
            let db = Database::new(&db_url).await.unwrap();

            let modules = db.get_all_modules().await.unwrap();
            assert_eq!(modules.len(), 2);
            assert_eq!(modules[0].title, "Systematic Investment Plans");

            let module = db.get_module("trading").await.unwrap().unwrap();
            assert_eq!(module.description, "Market basics");
        }
    }

    #[tokio::test]
    async fn test_repeated_sync_is_idempotent() {
        let temp_dir = create_temp_dir();
        let db_url = create_db_path(&temp_dir);

        let db = Database::new(&db_url).await.unwrap();
        db.initialize().await.unwrap();
        let config = Config::from_str(CATALOG).unwrap();

        for _ in 0..3 {
            db.sync_catalog(&config.modules).await.unwrap();
        }

        assert_eq!(db.get_all_modules().await.unwrap().len(), 2);
        assert_eq!(db.get_video_count_for_module("sip").await.unwrap(), 1);
    }
}

#[cfg(test)]
mod news_integration_tests {
    use finance_assistant::config::NewsConfig;
    use finance_assistant::news::{Category, NewsClient};
    use finance_assistant::view::{NewsView, ViewState};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, key: Option<&str>) -> NewsClient {
        let config = NewsConfig {
            endpoint: format!("{}/v2/everything", server.uri()),
            ..NewsConfig::default()
        };
        NewsClient::new(&config, key.map(str::to_string)).unwrap()
    }

    #[tokio::test]
    async fn test_crypto_with_no_articles_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/everything"))
            .and(query_param("q", "cryptocurrency OR bitcoin OR ethereum"))
            .and(query_param("pageSize", "12"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"status":"ok","totalResults":0,"articles":[]}"#,
                "application/json",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("key"));
        let mut view = NewsView::new(Category::Stocks);

        assert_eq!(view.load(&client, Category::Crypto).await, ViewState::Empty);
        assert!(view.articles().is_empty());
    }

    #[tokio::test]
    async fn test_switching_categories_replaces_articles() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("q", "stock market OR stocks OR equity"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"status":"ok","totalResults":1,"articles":[
                    {"source":{"name":"Wire"},"title":"Stocks up","url":"https://s.example.com/1","publishedAt":"2024-01-01T00:00:00Z"}
                ]}"#,
                "application/json",
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("q", "mutual funds OR investment funds"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("key"));
        let mut view = NewsView::new(Category::Stocks);

        assert_eq!(view.load(&client, Category::Stocks).await, ViewState::Loaded);
        assert_eq!(view.articles()[0].title, "Stocks up");

        assert_eq!(view.load(&client, Category::MutualFunds).await, ViewState::Error);
        assert!(view.articles().is_empty());
    }
}

#[cfg(test)]
mod end_to_end_tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use finance_assistant::config::NewsConfig;
    use finance_assistant::db::Database;
    use finance_assistant::news::NewsClient;
    use finance_assistant::routes::{router, AppState};
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FIXTURE: &str = r#"{"status":"ok","totalResults":3,"articles":[{"source":{"id":null,"name":"A"},"title":"One","description":"d1","url":"https://a.example.com/1","urlToImage":null,"publishedAt":"2024-05-01T10:00:00Z"},{"source":{"id":null,"name":"B"},"title":"Two","description":null,"url":"https://b.example.com/2","urlToImage":"https://img.example.com/2.png","publishedAt":"2024-05-02T10:00:00Z"},{"source":{"id":"c","name":"C"},"title":"Three","description":"d3","url":"https://c.example.com/3","urlToImage":null,"publishedAt":"2024-05-03T10:00:00Z"}]}"#;

    #[tokio::test]
    async fn test_proxy_round_trip_is_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(FIXTURE, "application/json"))
            .mount(&server)
            .await;

        let config = NewsConfig {
            endpoint: format!("{}/v2/everything", server.uri()),
            ..NewsConfig::default()
        };
        let db = Database::new("sqlite::memory:").await.unwrap();
        db.initialize().await.unwrap();
        let state = Arc::new(AppState {
            db: Arc::new(db),
            news: Arc::new(NewsClient::new(&config, Some("key".to_string())).unwrap()),
        });

        let response = router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/functions/fetch-finance-news")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"category":"crypto"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], FIXTURE.as_bytes());
    }
}
