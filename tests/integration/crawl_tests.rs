//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use sitepace::config::{parse_config, BackendKind, Config, StorageConfig};
use sitepace::crawler::{build_driver, crawl};
use sitepace::storage::{PageStore, SqliteStorage};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a configuration crawling the mock server from `/`
fn create_test_config(base_url: &str, once: bool, delay_ms: u64) -> Config {
    parse_config(&format!(
        r#"
[crawler]
once = {once}
fetch-timeout = 2000
user-agent = "TestBot/1.0"

[[domain]]
url = "{base_url}/"
name = "Mock"
delay = {delay_ms}
start-points = ["/"]
"#
    ))
    .expect("Failed to build test config")
}

fn html(title: &str, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!(
            "<html><head><title>{}</title></head><body>{}</body></html>",
            title, body
        ))
        .insert_header("content-type", "text/html")
}

/// Mounts a small site: `/` links to two pages and one foreign host
async fn mount_site(server: &MockServer) {
    let base_url = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            "Home",
            &format!(
                r#"<a href="{}/page1">Page 1</a>
                   <a href="/page2#intro">Page 2</a>
                   <a href="http://other.invalid/x">Elsewhere</a>"#,
                base_url
            ),
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(html("Page 1", r#"<a href="/">Home</a>"#))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let base_url = server.uri();

    let config = create_test_config(&base_url, true, 0);
    let mut driver = build_driver(&config).expect("Failed to build driver");
    let stats = driver.run().await.expect("Crawl failed");

    assert_eq!(stats.dispatched, 3);
    assert_eq!(stats.fetched, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.discovered, 2);

    let store = driver.store();
    let home = store.get_page(&format!("{}/", base_url)).unwrap();
    assert_eq!(home.title, "Home");
    assert!(home.last_change.is_some());

    let page1 = store.get_page(&format!("{}/page1", base_url)).unwrap();
    assert_eq!(page1.title, "Page 1");

    // Discovered but never fetched successfully
    let page2 = store.get_page(&format!("{}/page2", base_url)).unwrap();
    assert!(page2.is_stub());

    assert!(store.get_page("http://other.invalid/x").is_err());
}

#[tokio::test]
async fn test_sqlite_recrawl_detects_unchanged_content() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let base_url = server.uri();

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("pages.db");

    let mut config = create_test_config(&base_url, true, 0);
    config.storage = StorageConfig {
        backend: BackendKind::Sqlite,
        path: Some(db_path.to_string_lossy().into_owned()),
    };

    let first = crawl(&config).await.expect("First crawl failed");
    assert_eq!(first.modified, 2);
    assert_eq!(first.discovered, 2);

    let home_url = format!("{}/", base_url);
    let before = SqliteStorage::new(&db_path)
        .unwrap()
        .get_page(&home_url)
        .unwrap();

    // Same content again: nothing new is discovered and the change time holds
    let second = crawl(&config).await.expect("Second crawl failed");
    assert_eq!(second.dispatched, 1);
    assert_eq!(second.not_modified, 1);
    assert_eq!(second.discovered, 0);

    let storage = SqliteStorage::new(&db_path).unwrap();
    let after = storage.get_page(&home_url).unwrap();
    assert_eq!(after.last_change, before.last_change);
    assert_eq!(after.first_seen, before.first_seen);
    assert!(after.last_fetch > before.last_fetch);

    let host = url::Url::parse(&base_url)
        .unwrap()
        .host_str()
        .unwrap()
        .to_string();
    let exported = storage.get_pages(&host, "").unwrap();
    assert_eq!(exported.len(), 3);
    assert_eq!(storage.get_config().unwrap(), config.domains);
}

#[tokio::test]
async fn test_continuous_crawl_restarts_until_stopped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("Loop", "no links"))
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), false, 50);
    let mut driver = build_driver(&config).expect("Failed to build driver");

    let shutdown = driver.scheduler().shutdown_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(400)).await;
        shutdown.cancel();
    });

    let stats = tokio::time::timeout(Duration::from_secs(10), driver.run())
        .await
        .expect("Crawl did not stop")
        .expect("Crawl failed");

    assert!(stats.dispatched >= 2, "only {} dispatches", stats.dispatched);
    assert_eq!(stats.modified, 1);
    assert_eq!(stats.not_modified, stats.fetched - 1);

    let requests = server.received_requests().await.unwrap();
    assert!(requests.len() >= 2);
    assert!(requests.iter().all(|r| r.url.path() == "/"));
}

#[tokio::test]
async fn test_cross_host_redirect_is_not_followed() {
    let foreign = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html("Foreign", r#"<a href="/foreign-only">Only there</a>"#))
        .expect(0)
        .mount(&foreign)
        .await;

    let server = MockServer::start().await;
    let landing = format!("{}/landing", foreign.uri());
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", landing.as_str()))
        .mount(&server)
        .await;

    let base_url = server.uri();
    let config = create_test_config(&base_url, true, 0);
    let mut driver = build_driver(&config).expect("Failed to build driver");
    let stats = driver.run().await.expect("Crawl failed");

    assert_eq!(stats.dispatched, 1);
    assert_eq!(stats.fetched, 0);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.discovered, 0);

    let store = driver.store();
    assert!(store.get_page(&format!("{}/", base_url)).is_err());
    assert!(store
        .get_page(&format!("{}/foreign-only", base_url))
        .is_err());
    foreign.verify().await;
}
