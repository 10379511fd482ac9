//! Integration tests for the archiver
//!
//! These tests use wiremock to serve listing pages and run full passes of the
//! coordinator against a temporary working directory.

use chrono::NaiveDate;
use quote_archiver::config::Config;
use quote_archiver::crawler::Coordinator;
use quote_archiver::state::{CrawlState, Cursor, IdOrdering};
use quote_archiver::ArchiverError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Start date of every pass, so abyss-best URLs are predictable
fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
}

fn quote_html(id: &str) -> String {
    format!(
        r#"<div class="quote">
            <div class="actions">
                <span class="date">2026-01-15 10:{:0>2}</span>
                <a class="id" href="/quote/{}">#{}</a>
            </div>
            <div class="text">quote {}<br>second line</div>
        </div>"#,
        id.len(),
        id,
        id,
        id
    )
}

fn listing_html(ids: &[&str], page_count: Option<u32>) -> String {
    let quotes: String = ids.iter().map(|id| quote_html(id)).collect();
    let pager = page_count
        .map(|count| {
            format!(
                r#"<div class="pager"><form><span class="current"><input class="page" value="{}"></span></form></div>"#,
                count
            )
        })
        .unwrap_or_default();
    format!("<html><body>{}{}</body></html>", quotes, pager)
}

fn html_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html_response(body))
        .expect(1)
        .mount(server)
        .await;
}

/// A mock site plus a scratch directory holding output dirs and the state file
struct Fixture {
    server: MockServer,
    dir: TempDir,
}

impl Fixture {
    async fn new() -> Self {
        let server = MockServer::start().await;
        let dir = TempDir::new().expect("Failed to create temp dir");
        std::fs::create_dir(dir.path().join("main")).unwrap();
        std::fs::create_dir(dir.path().join("abyssbest")).unwrap();
        Self { server, dir }
    }

    fn config(&self) -> Config {
        let mut config = Config::default();
        config.feeds.main.base_url = format!("{}/index", self.server.uri());
        config.feeds.main.output_dir = self.main_dir().to_string_lossy().into_owned();
        config.feeds.abyss_best.base_url = format!("{}/abyssbest", self.server.uri());
        config.feeds.abyss_best.output_dir = self.abyss_dir().to_string_lossy().into_owned();
        config.state.path = self.state_path().to_string_lossy().into_owned();
        config
    }

    fn main_dir(&self) -> PathBuf {
        self.dir.path().join("main")
    }

    fn abyss_dir(&self) -> PathBuf {
        self.dir.path().join("abyssbest")
    }

    fn state_path(&self) -> PathBuf {
        self.dir.path().join("cache.json")
    }

    fn write_state(&self, main: &str, abyss_best: &str) {
        let state = format!(
            r#"{{"mainQuoteId":"{}","abyssBestQuoteId":"{}"}}"#,
            main, abyss_best
        );
        std::fs::write(self.state_path(), state).unwrap();
    }

    fn read_state(&self) -> CrawlState {
        let content = std::fs::read_to_string(self.state_path()).expect("state file missing");
        serde_json::from_str(&content).expect("state file malformed")
    }

    async fn run(&self, config: Config) -> Result<quote_archiver::CrawlSummary, ArchiverError> {
        Coordinator::new(config, false)
            .expect("Failed to create coordinator")
            .run_from(start_date())
            .await
    }
}

fn saved_ids(dir: &Path) -> Vec<String> {
    let mut ids: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| {
            let name = entry.unwrap().file_name().to_string_lossy().into_owned();
            name.split('@').next().unwrap().to_string()
        })
        .collect();
    ids.sort();
    ids
}

#[tokio::test]
async fn test_new_quotes_on_front_page_are_saved() {
    let fx = Fixture::new().await;
    fx.write_state("100", "#50");

    mount_page(&fx.server, "/index", listing_html(&["105", "104", "103"], None)).await;
    mount_page(&fx.server, "/abyssbest/20260115", listing_html(&[], None)).await;

    let summary = fx.run(fx.config()).await.expect("crawl failed");

    assert_eq!(summary.main_saved, 3);
    assert_eq!(summary.abyss_best_saved, 0);
    assert_eq!(saved_ids(&fx.main_dir()), vec!["103", "104", "105"]);

    let state = fx.read_state();
    assert_eq!(state.main, Cursor::new("105"));
    assert_eq!(state.abyss_best, Cursor::new("#50"));

    let body = std::fs::read_to_string(fx.main_dir().join("105@2026-01-15 10:03.txt")).unwrap();
    assert_eq!(body, "quote 105\nsecond line");
}

#[tokio::test]
async fn test_nothing_new_keeps_cursor() {
    let fx = Fixture::new().await;
    fx.write_state("100", "#50");

    mount_page(&fx.server, "/index", listing_html(&["100", "99"], None)).await;
    mount_page(&fx.server, "/abyssbest/20260115", listing_html(&[], None)).await;

    let summary = fx.run(fx.config()).await.expect("crawl failed");

    assert_eq!(summary.main_saved, 0);
    assert!(saved_ids(&fx.main_dir()).is_empty());
    assert_eq!(fx.read_state().main, Cursor::new("100"));
}

#[tokio::test]
async fn test_lexicographic_ordering_admits_shorter_ids() {
    let fx = Fixture::new().await;
    fx.write_state("100", "#50");

    mount_page(&fx.server, "/index", listing_html(&["100", "99"], None)).await;
    mount_page(&fx.server, "/abyssbest/20260115", listing_html(&[], None)).await;

    let mut config = fx.config();
    config.crawler.id_ordering = IdOrdering::Lexicographic;
    let summary = fx.run(config).await.expect("crawl failed");

    assert_eq!(summary.main_saved, 1);
    assert_eq!(saved_ids(&fx.main_dir()), vec!["99"]);
    assert_eq!(fx.read_state().main, Cursor::new("99"));
}

#[tokio::test]
async fn test_abyss_failure_leaves_state_untouched() {
    let fx = Fixture::new().await;
    fx.write_state("100", "#50");
    let before = std::fs::read(fx.state_path()).unwrap();

    mount_page(&fx.server, "/index", listing_html(&["105", "104", "103"], None)).await;
    Mock::given(method("GET"))
        .and(path("/abyssbest/20260115"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&fx.server)
        .await;

    let result = fx.run(fx.config()).await;

    match result {
        Err(e) => assert!(e.is_transport(), "unexpected error: {}", e),
        Ok(summary) => panic!("crawl should fail, got {:?}", summary),
    }
    assert_eq!(std::fs::read(fx.state_path()).unwrap(), before);
}

/// Address of a local port with nothing listening on it
fn closed_port_uri() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_connection_failure_leaves_state_untouched() {
    let fx = Fixture::new().await;
    fx.write_state("100", "#50");
    let before = std::fs::read(fx.state_path()).unwrap();

    mount_page(&fx.server, "/index", listing_html(&["105"], None)).await;

    let mut config = fx.config();
    config.feeds.abyss_best.base_url = format!("{}/abyssbest", closed_port_uri());
    let result = fx.run(config).await;

    match result {
        Err(e @ ArchiverError::Transport { .. }) => assert!(e.is_transport()),
        Err(e) => panic!("expected a transport error, got {}", e),
        Ok(summary) => panic!("crawl should fail, got {:?}", summary),
    }
    assert_eq!(std::fs::read(fx.state_path()).unwrap(), before);
}

#[tokio::test]
async fn test_failure_on_first_run_writes_no_state() {
    let fx = Fixture::new().await;

    mount_page(&fx.server, "/index", listing_html(&["5", "4"], None)).await;
    // Nothing mounted for abyss-best: the mock server answers 404

    let result = fx.run(fx.config()).await;

    assert!(matches!(result, Err(ArchiverError::HttpStatus { status: 404, .. })));
    assert!(!fx.state_path().exists());
}

#[tokio::test]
async fn test_main_walk_follows_pages_down_to_cursor() {
    let fx = Fixture::new().await;
    fx.write_state("203", "#50");

    mount_page(&fx.server, "/index", listing_html(&["305", "304"], Some(3))).await;
    mount_page(&fx.server, "/index/2", listing_html(&["204", "203"], Some(3))).await;
    mount_page(&fx.server, "/index/1", listing_html(&["104", "103"], Some(3))).await;
    mount_page(&fx.server, "/abyssbest/20260115", listing_html(&[], None)).await;

    let summary = fx.run(fx.config()).await.expect("crawl failed");

    assert_eq!(summary.main_saved, 3);
    assert_eq!(summary.pages_fetched, 4);
    assert_eq!(saved_ids(&fx.main_dir()), vec!["204", "304", "305"]);
    assert_eq!(fx.read_state().main, Cursor::new("305"));
}

#[tokio::test]
async fn test_main_walk_stops_at_first_page() {
    let fx = Fixture::new().await;

    mount_page(&fx.server, "/index", listing_html(&["3", "2"], Some(2))).await;
    mount_page(&fx.server, "/index/1", listing_html(&["1"], Some(2))).await;
    mount_page(&fx.server, "/abyssbest/20260115", listing_html(&[], None)).await;

    let summary = fx.run(fx.config()).await.expect("crawl failed");

    // Page 0 is never requested
    assert_eq!(summary.main_saved, 3);
    assert_eq!(fx.read_state().main, Cursor::new("3"));
}

#[tokio::test]
async fn test_abyss_walk_steps_back_by_day() {
    let fx = Fixture::new().await;
    fx.write_state("0", "800");

    mount_page(&fx.server, "/index", listing_html(&[], None)).await;
    mount_page(&fx.server, "/abyssbest/20260115", listing_html(&["900", "899"], None)).await;
    mount_page(&fx.server, "/abyssbest/20260114", listing_html(&["850"], None)).await;
    mount_page(&fx.server, "/abyssbest/20260113", listing_html(&["10"], None)).await;

    let summary = fx.run(fx.config()).await.expect("crawl failed");

    assert_eq!(summary.abyss_best_saved, 3);
    assert_eq!(saved_ids(&fx.abyss_dir()), vec!["850", "899", "900"]);

    let state = fx.read_state();
    assert_eq!(state.abyss_best, Cursor::new("900"));
    assert_eq!(state.main, Cursor::new("0"));
}

#[tokio::test]
async fn test_abyss_walk_bounded_by_lookback() {
    let fx = Fixture::new().await;

    mount_page(&fx.server, "/index", listing_html(&[], None)).await;
    // Every day has a quote newer than the cursor, so only the window stops the walk
    Mock::given(method("GET"))
        .and(path_regex(r"^/abyssbest/\d{8}$"))
        .respond_with(html_response(listing_html(&["900"], None)))
        .expect(32)
        .mount(&fx.server)
        .await;

    let mut config = fx.config();
    config.crawler.lookback_months = 1;
    let summary = fx.run(config).await.expect("crawl failed");

    // 2025-12-15 ..= 2026-01-15, plus the main front page
    assert_eq!(summary.pages_fetched, 33);
    assert_eq!(saved_ids(&fx.abyss_dir()), vec!["900"]);
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let fx = Fixture::new().await;

    Mock::given(method("GET"))
        .and(path("/index"))
        .respond_with(html_response(listing_html(&["105", "104", "103"], None)))
        .expect(2)
        .mount(&fx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/abyssbest/20260115"))
        .respond_with(html_response(listing_html(&[], None)))
        .expect(2)
        .mount(&fx.server)
        .await;

    let first = fx.run(fx.config()).await.expect("first crawl failed");
    assert_eq!(first.main_saved, 3);
    let state_after_first = std::fs::read(fx.state_path()).unwrap();

    let second = fx.run(fx.config()).await.expect("second crawl failed");
    assert_eq!(second.total_saved(), 0);
    assert_eq!(std::fs::read(fx.state_path()).unwrap(), state_after_first);
}

#[tokio::test]
async fn test_corrupt_state_is_first_run() {
    let fx = Fixture::new().await;
    std::fs::write(fx.state_path(), "not json at all").unwrap();

    mount_page(&fx.server, "/index", listing_html(&["12"], None)).await;
    mount_page(&fx.server, "/abyssbest/20260115", listing_html(&[], None)).await;

    let summary = fx.run(fx.config()).await.expect("crawl failed");

    assert_eq!(summary.main_saved, 1);
    let state = fx.read_state();
    assert_eq!(state.main, Cursor::new("12"));
    assert_eq!(state.abyss_best, Cursor::new("#0"));
}

#[tokio::test]
async fn test_fresh_run_ignores_stored_state() {
    let fx = Fixture::new().await;
    fx.write_state("500", "#50");

    mount_page(&fx.server, "/index", listing_html(&["105"], None)).await;
    mount_page(&fx.server, "/abyssbest/20260115", listing_html(&[], None)).await;

    let summary = Coordinator::new(fx.config(), true)
        .unwrap()
        .run_from(start_date())
        .await
        .expect("crawl failed");

    assert_eq!(summary.main_saved, 1);
    assert_eq!(fx.read_state().main, Cursor::new("105"));
}

#[tokio::test]
async fn test_missing_output_dir_fails_without_state() {
    let fx = Fixture::new().await;
    fx.write_state("100", "#50");
    let before = std::fs::read(fx.state_path()).unwrap();
    std::fs::remove_dir(fx.main_dir()).unwrap();

    mount_page(&fx.server, "/index", listing_html(&["101"], None)).await;
    mount_page(&fx.server, "/abyssbest/20260115", listing_html(&[], None)).await;

    let result = fx.run(fx.config()).await;

    assert!(matches!(result, Err(ArchiverError::Persistence { .. })));
    assert!(!fx.main_dir().exists());
    assert_eq!(std::fs::read(fx.state_path()).unwrap(), before);
}

#[tokio::test]
async fn test_windows_1251_pages_are_transcoded() {
    let fx = Fixture::new().await;

    let html = r##"<html><body><div class="quote">
        <div class="actions"><span class="date">01.05.2016</span><a class="id">#42</a></div>
        <div class="text">Привет<br>мир</div>
    </div></body></html>"##;
    let (bytes, _, _) = encoding_rs::WINDOWS_1251.encode(html);

    Mock::given(method("GET"))
        .and(path("/index"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(bytes.into_owned())
                .insert_header("content-type", "text/html"),
        )
        .mount(&fx.server)
        .await;
    mount_page(&fx.server, "/abyssbest/20260115", listing_html(&[], None)).await;

    fx.run(fx.config()).await.expect("crawl failed");

    let body = std::fs::read_to_string(fx.main_dir().join("42@01.05.2016.txt")).unwrap();
    assert_eq!(body, "Привет\nмир");
}
