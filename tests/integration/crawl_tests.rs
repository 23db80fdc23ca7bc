//! Integration tests for the crawler
//!
//! These tests run wiremock as the HTTP proxy the checker routes through,
//! so the onion directory, the probed sites, and the IP-echo endpoint are
//! all served by the mock server and told apart by path.

use onion_checker::config::Config;
use onion_checker::crawler::Coordinator;
use onion_checker::storage::{
    AccessibleSiteSet, JsonFileStore, SaveSnapshot, SiteStore, StoreError, StoreResult,
};
use onion_checker::{CheckerError, CrawlPhase};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DIRECTORY_URL: &str = "http://directoryexample.onion/listing";
const IP_ECHO_URL: &str = "http://ip-echo.test/ip";

/// Creates a configuration that proxies everything through the mock server
fn create_test_config(mock_server: &MockServer, dir: &TempDir) -> Config {
    let proxy = url::Url::parse(&mock_server.uri()).expect("Failed to parse mock URI");

    let mut config = Config::default();
    config.proxy.scheme = "http".to_string();
    config.proxy.host = proxy.host_str().expect("mock host").to_string();
    config.proxy.port = proxy.port().expect("mock port");
    config.directory.base_url = DIRECTORY_URL.to_string();
    config.probe.connectivity_url = IP_ECHO_URL.to_string();
    config.probe.timeout_secs = 5;
    config.retry.initial_backoff_ms = 1;
    config.crawl.start_page = 1;
    config.crawl.max_pages = 1;
    config.crawl.min_delay_secs = 0.0;
    config.crawl.max_delay_secs = 0.0;
    config.crawl.min_page_delay_secs = 0.0;
    config.crawl.max_page_delay_secs = 0.0;
    config.output.sites_path = sites_path(dir).to_string_lossy().into_owned();
    config
}

fn sites_path(dir: &TempDir) -> PathBuf {
    dir.path().join("accessible_onion_sites.json")
}

/// Builds a directory page listing the given (href, text) links
fn listing_page(links: &[(&str, &str)]) -> String {
    let items: String = links
        .iter()
        .map(|(href, text)| format!(r#"<li><a href="{}">{}</a></li>"#, href, text))
        .collect();
    format!(
        r#"<html><head><title>Directory</title></head><body>
        <a href="http://sidebar.onion/">Sidebar</a>
        <ul id="link_list">{}</ul>
        </body></html>"#,
        items
    )
}

async fn mount_ip_echo(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/ip"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"origin": "198.51.100.7"}"#))
        .mount(mock_server)
        .await;
}

async fn mount_listing(mock_server: &MockServer, page: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/listing"))
        .and(query_param("page", page))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(mock_server)
        .await;
}

async fn mount_site(mock_server: &MockServer, site_path: &str, status: u16, expected: u64) {
    Mock::given(method("GET"))
        .and(path(site_path))
        .respond_with(ResponseTemplate::new(status).set_body_string("<html>site</html>"))
        .expect(expected)
        .mount(mock_server)
        .await;
}

fn read_document(dir: &TempDir) -> serde_json::Value {
    let content = std::fs::read_to_string(sites_path(dir)).expect("Failed to read sites file");
    serde_json::from_str(&content).expect("Sites file is not JSON")
}

fn stored_domains(document: &serde_json::Value) -> Vec<String> {
    document["accessible_sites"]
        .as_array()
        .expect("accessible_sites array")
        .iter()
        .map(|site| site["domain"].as_str().expect("domain").to_string())
        .collect()
}

#[tokio::test]
async fn test_full_crawl_records_reachable_sites() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_ip_echo(&mock_server).await;
    mount_listing(
        &mock_server,
        "1",
        listing_page(&[
            ("http://alivesite.onion/alive", "Alive"),
            ("deadsite.onion/dead", "Dead"),
            ("https://clearnet.example/page", "Clearnet"),
            ("//secondsite.onion/second", " Second site "),
        ]),
    )
    .await;
    mount_site(&mock_server, "/alive", 200, 1).await;
    mount_site(&mock_server, "/dead", 404, 1).await;
    mount_site(&mock_server, "/second", 200, 1).await;
    mount_site(&mock_server, "/page", 200, 0).await;

    let config = create_test_config(&mock_server, &dir);
    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let report = coordinator
        .run_until(std::future::pending::<()>())
        .await
        .expect("Crawl failed");

    assert_eq!(report.phase, CrawlPhase::Finished);
    assert!(!report.interrupted);
    assert_eq!(report.total_accessible, 2);
    assert_eq!(report.stats.pages_checked, 1);
    assert_eq!(report.stats.sites_found, 3);
    assert_eq!(report.stats.sites_accessible, 2);
    assert_eq!(report.stats.sites_unreachable, 1);

    let document = read_document(&dir);
    assert_eq!(document["total_accessible_sites"], 2);
    assert_eq!(
        stored_domains(&document),
        vec!["alivesite.onion", "secondsite.onion"]
    );
    assert_eq!(document["accessible_sites"][1]["text"], "Second site");
    assert_eq!(
        document["accessible_sites"][1]["url"],
        "http://secondsite.onion/second"
    );
    assert_eq!(document["accessible_sites"][0]["status"], "accessible");
}

#[tokio::test]
async fn test_recrawl_does_not_duplicate_addresses() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_ip_echo(&mock_server).await;
    mount_listing(
        &mock_server,
        "1",
        listing_page(&[
            ("http://alivesite.onion/alive", "Alive"),
            ("http://deadsite.onion/dead", "Dead"),
        ]),
    )
    .await;
    // Probed on the first run only; the second run already knows it.
    mount_site(&mock_server, "/alive", 200, 1).await;
    mount_site(&mock_server, "/dead", 404, 2).await;

    for _ in 0..2 {
        let config = create_test_config(&mock_server, &dir);
        Coordinator::new(config)
            .expect("Failed to create coordinator")
            .run_until(std::future::pending::<()>())
            .await
            .expect("Crawl failed");
    }

    let document = read_document(&dir);
    assert_eq!(document["total_accessible_sites"], 1);
    assert_eq!(stored_domains(&document), vec!["alivesite.onion"]);
}

#[tokio::test]
async fn test_duplicate_links_on_page_probed_once() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_ip_echo(&mock_server).await;
    mount_listing(
        &mock_server,
        "1",
        listing_page(&[
            ("http://alivesite.onion/alive", "Alive"),
            ("http://alivesite.onion/other", "Alive again"),
        ]),
    )
    .await;
    mount_site(&mock_server, "/alive", 200, 1).await;
    mount_site(&mock_server, "/other", 200, 0).await;

    let config = create_test_config(&mock_server, &dir);
    let report = Coordinator::new(config)
        .expect("Failed to create coordinator")
        .run_until(std::future::pending::<()>())
        .await
        .expect("Crawl failed");

    assert_eq!(report.total_accessible, 1);
    assert_eq!(report.stats.sites_known, 1);
    assert_eq!(read_document(&dir)["total_accessible_sites"], 1);
}

#[tokio::test]
async fn test_connectivity_failure_aborts_before_crawling() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/ip"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/listing"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, &dir);
    let report = Coordinator::new(config)
        .expect("Failed to create coordinator")
        .run_until(std::future::pending::<()>())
        .await
        .expect("An aborted run is not an error");

    assert_eq!(report.phase, CrawlPhase::Aborted);
    assert_eq!(report.stats.pages_checked, 0);
    assert!(!sites_path(&dir).exists());
}

#[tokio::test]
async fn test_failed_page_is_skipped_without_delay() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_ip_echo(&mock_server).await;
    Mock::given(method("GET"))
        .and(path("/listing"))
        .and(query_param("page", "5"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_listing(
        &mock_server,
        "6",
        listing_page(&[("http://alivesite.onion/alive", "Alive")]),
    )
    .await;
    mount_site(&mock_server, "/alive", 200, 1).await;

    let mut config = create_test_config(&mock_server, &dir);
    config.crawl.start_page = 5;
    config.crawl.max_pages = 2;
    // A page pause anywhere in this run would blow the timeout below.
    config.crawl.min_page_delay_secs = 60.0;
    config.crawl.max_page_delay_secs = 60.0;

    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let report = tokio::time::timeout(
        Duration::from_secs(20),
        coordinator.run_until(std::future::pending::<()>()),
    )
    .await
    .expect("Run paused after a failed page")
    .expect("Crawl failed");

    assert_eq!(report.stats.pages_checked, 2);
    assert_eq!(report.stats.pages_failed, 1);
    assert_eq!(report.stats.sites_found, 1);
    assert_eq!(stored_domains(&read_document(&dir)), vec!["alivesite.onion"]);
}

#[tokio::test]
async fn test_interrupt_triggers_final_save() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_ip_echo(&mock_server).await;
    mount_listing(
        &mock_server,
        "1",
        listing_page(&[("http://alivesite.onion/alive", "Alive")]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/listing"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[])))
        .expect(0)
        .mount(&mock_server)
        .await;
    mount_site(&mock_server, "/alive", 200, 1).await;

    let mut config = create_test_config(&mock_server, &dir);
    config.crawl.max_pages = 2;
    config.crawl.min_page_delay_secs = 60.0;
    config.crawl.max_page_delay_secs = 60.0;

    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let report = tokio::time::timeout(
        Duration::from_secs(20),
        coordinator.run_until(tokio::time::sleep(Duration::from_millis(1500))),
    )
    .await
    .expect("Shutdown signal was ignored")
    .expect("Crawl failed");

    assert!(report.interrupted);
    assert_eq!(report.phase, CrawlPhase::Finished);
    assert_eq!(report.total_accessible, 1);

    let document = read_document(&dir);
    assert_eq!(document["total_accessible_sites"], 1);
}

#[tokio::test]
async fn test_legacy_document_is_respected_and_upgraded() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    std::fs::write(
        sites_path(&dir),
        r#"[
            {
                "domain": "alivesite.onion",
                "url": "http://alivesite.onion/alive",
                "text": "Alive",
                "status": "accessible",
                "tested_at": "2023-11-02T08:15:30.250000",
                "response_time": 4.2
            }
        ]"#,
    )
    .unwrap();

    mount_ip_echo(&mock_server).await;
    mount_listing(
        &mock_server,
        "1",
        listing_page(&[
            ("http://alivesite.onion/alive", "Alive"),
            ("http://newsite.onion/new", "New"),
        ]),
    )
    .await;
    mount_site(&mock_server, "/alive", 200, 0).await;
    mount_site(&mock_server, "/new", 200, 1).await;

    let config = create_test_config(&mock_server, &dir);
    let report = Coordinator::new(config)
        .expect("Failed to create coordinator")
        .run_until(std::future::pending::<()>())
        .await
        .expect("Crawl failed");

    assert_eq!(report.total_accessible, 2);

    let document = read_document(&dir);
    assert!(document.is_object());
    assert_eq!(document["total_accessible_sites"], 2);
    assert_eq!(
        stored_domains(&document),
        vec!["alivesite.onion", "newsite.onion"]
    );
    assert_eq!(document["accessible_sites"][0]["response_time"], 4.2);
}

#[tokio::test]
async fn test_page_counter_overflow_still_saves() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let last_page = u128::MAX.to_string();

    mount_ip_echo(&mock_server).await;
    mount_listing(
        &mock_server,
        &last_page,
        listing_page(&[("http://alivesite.onion/alive", "Alive")]),
    )
    .await;
    mount_site(&mock_server, "/alive", 200, 1).await;

    let mut config = create_test_config(&mock_server, &dir);
    config.crawl.start_page = u128::MAX;
    config.crawl.max_pages = 3;

    let report = Coordinator::new(config)
        .expect("Failed to create coordinator")
        .run_until(std::future::pending::<()>())
        .await
        .expect("A loop error must not fail the run");

    // The loop stops at the overflow; the site from the last page is kept.
    assert_eq!(report.phase, CrawlPhase::Finished);
    assert!(!report.interrupted);
    assert_eq!(report.stats.pages_checked, 1);
    assert_eq!(report.total_accessible, 1);
    assert_eq!(stored_domains(&read_document(&dir)), vec!["alivesite.onion"]);
}

/// A store whose saves always fail, counting the attempts
struct FailingStore {
    saves: Arc<AtomicUsize>,
}

impl SiteStore for FailingStore {
    fn load(&self) -> StoreResult<AccessibleSiteSet> {
        Ok(AccessibleSiteSet::new())
    }

    fn save(&self, _set: &mut AccessibleSiteSet) -> StoreResult<SaveSnapshot> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Io {
            path: PathBuf::from("/full/disk.json"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "no space left on device"),
        })
    }

    fn location(&self) -> String {
        "/full/disk.json".to_string()
    }
}

#[tokio::test]
async fn test_save_failures_do_not_stop_the_crawl() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_ip_echo(&mock_server).await;
    mount_listing(
        &mock_server,
        "1",
        listing_page(&[
            ("http://alivesite.onion/alive", "Alive"),
            ("http://secondsite.onion/second", "Second"),
        ]),
    )
    .await;
    mount_site(&mock_server, "/alive", 200, 1).await;
    mount_site(&mock_server, "/second", 200, 1).await;

    let saves = Arc::new(AtomicUsize::new(0));
    let store = FailingStore {
        saves: Arc::clone(&saves),
    };

    let config = create_test_config(&mock_server, &dir);
    let result = Coordinator::with_store(config, store)
        .expect("Failed to create coordinator")
        .run_until(std::future::pending::<()>())
        .await;

    // Two saves during the crawl, then the final save whose failure surfaces.
    assert!(matches!(result, Err(CheckerError::Store(_))));
    assert_eq!(saves.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_save_and_load_round_trip_through_store() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_ip_echo(&mock_server).await;
    mount_listing(
        &mock_server,
        "1",
        listing_page(&[("http://alivesite.onion/alive", "Alive")]),
    )
    .await;
    mount_site(&mock_server, "/alive", 200, 1).await;

    let config = create_test_config(&mock_server, &dir);
    Coordinator::new(config)
        .expect("Failed to create coordinator")
        .run_until(std::future::pending::<()>())
        .await
        .expect("Crawl failed");

    let loaded = JsonFileStore::new(sites_path(&dir)).load().unwrap();
    assert_eq!(loaded.len(), 1);
    assert!(loaded.contains("alivesite.onion"));
    assert!(loaded.last_updated().is_some());
}
