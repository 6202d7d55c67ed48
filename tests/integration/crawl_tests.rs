//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full crawl cycle
//! end-to-end: fetching, link extraction, visitor output and report sinks.

use seo_sweep::config::Config;
use seo_sweep::crawler::{
    run_report, CancellationToken, CrawlObserver, CrawlStatus, CrawlSummary, Crawler,
};
use seo_sweep::output::{
    CsvSink, MemorySink, OutputError, OutputResult, ReportInfo, ReportSink, Row, SqliteSink,
    TeeSink,
};
use seo_sweep::{AuditError, ProgressSample, ReportKind};
use std::time::Duration;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Observer that records everything it is told
#[derive(Debug, Default)]
struct RecordingObserver {
    samples: Vec<ProgressSample>,
    completions: Vec<CrawlStatus>,
}

impl CrawlObserver for RecordingObserver {
    fn on_progress(&mut self, sample: ProgressSample) {
        self.samples.push(sample);
    }

    fn on_complete(&mut self, status: CrawlStatus) {
        self.completions.push(status);
    }
}

/// Creates a test configuration with short timeouts
fn create_test_config() -> Config {
    let mut config = Config::default();
    config.crawler.request_timeout_secs = 2;
    config.crawler.connect_timeout_secs = 1;
    config.crawler.image_probe_timeout_secs = 1;
    config.user_agent.crawler_name = "TestBot".to_string();
    config
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body.to_string())
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

fn seed(server: &MockServer) -> Url {
    Url::parse(&server.uri()).expect("Failed to parse base URL")
}

async fn run(
    server: &MockServer,
    kind: ReportKind,
    cancel: &CancellationToken,
    observer: &mut dyn CrawlObserver,
) -> (MemorySink, CrawlSummary) {
    let mut sink = MemorySink::new();
    let summary = run_report(
        create_test_config(),
        kind,
        &seed(server),
        &mut sink,
        cancel,
        observer,
    )
    .await
    .expect("Crawl failed");
    (sink, summary)
}

/// Mounts the four-page site: A -> {B, C}, B -> {A, D}, C answers 404
async fn mount_four_page_site(server: &MockServer) {
    mount_page(
        server,
        "/",
        r#"<html><head><title>Page A</title></head><body>
        <a href="/b">B</a><a href="/c">C</a>
        </body></html>"#,
    )
    .await;
    mount_page(
        server,
        "/b",
        r#"<html><head><title>Page B</title></head><body>
        <a href="/">A</a><a href="/d#section">D</a>
        </body></html>"#,
    )
    .await;
    mount_page(server, "/d", "<html><head><title>Page D</title></head></html>").await;
    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_error_report_four_page_site() {
    let server = MockServer::start().await;
    mount_four_page_site(&server).await;

    let mut observer = RecordingObserver::default();
    let (sink, summary) = run(
        &server,
        ReportKind::Errors,
        &CancellationToken::new(),
        &mut observer,
    )
    .await;

    assert_eq!(summary.status, CrawlStatus::Completed);
    assert_eq!(summary.pages_visited, 4);
    assert_eq!(summary.pages_discovered, 4);
    assert_eq!(summary.fetch_failures, 0);

    let base = server.uri();
    let urls: Vec<&str> = sink.rows.iter().filter_map(|r| r.get(1)).collect();
    assert_eq!(
        urls,
        vec![
            format!("{}/", base),
            format!("{}/b", base),
            format!("{}/d", base),
            format!("{}/c", base)
        ]
    );

    assert_eq!(sink.rows_where(2, "404 Not Found").len(), 1);
    assert_eq!(sink.rows_where(2, "Page Found").len(), 3);
    assert_eq!(sink.rows[3].get(0), Some("Article 4"));
    assert_eq!(sink.summary_value("Total Pages with Issues:"), Some("1"));

    assert_eq!(observer.completions, vec![CrawlStatus::Completed]);
    assert_eq!(
        observer.samples.last().copied(),
        Some(ProgressSample {
            visited: 4,
            discovered: 4
        })
    );
}

#[tokio::test]
async fn test_no_page_is_fetched_twice() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r##"<a href="/#top">Top</a><a href="/b">B</a><a href="/b#x">B again</a>
        <a href="b">B relative</a>"##,
    )
    .await;
    mount_page(&server, "/b", r#"<a href="/">Home</a>"#).await;

    let (_, summary) = run(
        &server,
        ReportKind::Titles,
        &CancellationToken::new(),
        &mut RecordingObserver::default(),
    )
    .await;

    assert_eq!(summary.pages_visited, 2);
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}

const CHAIN_LENGTH: usize = 2000;

/// Page `/` links to `/p/1`, and every `/p/n` links home and to `/p/{n+1}`
fn chain_page(request: &Request) -> ResponseTemplate {
    let n: usize = request
        .url
        .path()
        .trim_start_matches("/p/")
        .parse()
        .unwrap_or(0);
    let next = if n + 1 < CHAIN_LENGTH {
        format!(r#"<a href="/p/{}">Next</a>"#, n + 1)
    } else {
        String::new()
    };
    html(&format!(
        r#"<html><head><title>Page {}</title></head><body><a href="/">Home</a>{}</body></html>"#,
        n, next
    ))
}

#[tokio::test]
async fn test_long_link_chain_is_crawled_depth_first() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(chain_page)
        .mount(&server)
        .await;

    let mut observer = RecordingObserver::default();
    let (sink, summary) = run(
        &server,
        ReportKind::Errors,
        &CancellationToken::new(),
        &mut observer,
    )
    .await;

    assert_eq!(summary.status, CrawlStatus::Completed);
    assert_eq!(summary.pages_visited, CHAIN_LENGTH as u64);
    assert_eq!(summary.pages_discovered, CHAIN_LENGTH as u64);

    let base = server.uri();
    let expected: Vec<String> = std::iter::once(format!("{}/", base))
        .chain((1..CHAIN_LENGTH).map(|n| format!("{}/p/{}", base, n)))
        .collect();
    let urls: Vec<&str> = sink.rows.iter().filter_map(|r| r.get(1)).collect();
    assert_eq!(urls, expected);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), CHAIN_LENGTH);
    assert_eq!(observer.completions, vec![CrawlStatus::Completed]);
}

#[tokio::test]
async fn test_cancel_before_start() {
    let server = MockServer::start().await;
    mount_four_page_site(&server).await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut observer = RecordingObserver::default();
    let (sink, summary) = run(&server, ReportKind::Errors, &cancel, &mut observer).await;

    assert_eq!(summary.status, CrawlStatus::Cancelled);
    assert_eq!(summary.pages_visited, 0);
    assert!(sink.rows.is_empty());
    assert!(sink.is_finished());
    assert_eq!(
        observer.samples,
        vec![ProgressSample {
            visited: 0,
            discovered: 1
        }]
    );
    assert_eq!(observer.completions, vec![CrawlStatus::Cancelled]);
    assert!(server.received_requests().await.unwrap().is_empty());
}

/// Cancels the crawl as soon as the first page is finished
struct CancelAfterFirstPage {
    cancel: CancellationToken,
    inner: RecordingObserver,
}

impl CrawlObserver for CancelAfterFirstPage {
    fn on_progress(&mut self, sample: ProgressSample) {
        if sample.discovered > 1 {
            self.cancel.cancel();
        }
        self.inner.on_progress(sample);
    }

    fn on_complete(&mut self, status: CrawlStatus) {
        self.inner.on_complete(status);
    }
}

#[tokio::test]
async fn test_cancel_mid_crawl_converges() {
    let server = MockServer::start().await;
    mount_four_page_site(&server).await;

    let cancel = CancellationToken::new();
    let mut observer = CancelAfterFirstPage {
        cancel: cancel.clone(),
        inner: RecordingObserver::default(),
    };
    let (_, summary) = run(&server, ReportKind::Titles, &cancel, &mut observer).await;

    assert_eq!(summary.status, CrawlStatus::Cancelled);
    assert_eq!(summary.pages_visited, 1);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
    assert_eq!(observer.inner.completions, vec![CrawlStatus::Cancelled]);
}

#[tokio::test]
async fn test_progress_is_monotonic() {
    let server = MockServer::start().await;
    mount_four_page_site(&server).await;

    let mut observer = RecordingObserver::default();
    run(
        &server,
        ReportKind::H1,
        &CancellationToken::new(),
        &mut observer,
    )
    .await;

    assert_eq!(
        observer.samples.first().copied(),
        Some(ProgressSample {
            visited: 0,
            discovered: 1
        })
    );
    for pair in observer.samples.windows(2) {
        assert!(pair[1].visited >= pair[0].visited);
        assert!(pair[1].discovered >= pair[0].discovered);
    }
    assert!(observer
        .samples
        .iter()
        .all(|sample| sample.discovered >= sample.visited));
}

#[tokio::test]
async fn test_duplicate_h1_across_pages() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<h1>Welcome</h1><a href="/b">B</a>"#).await;
    mount_page(&server, "/b", r#"<h1>welcome</h1><a href="/c">C</a>"#).await;
    mount_page(&server, "/c", "<p>No heading here</p>").await;

    let (sink, _) = run(
        &server,
        ReportKind::H1,
        &CancellationToken::new(),
        &mut RecordingObserver::default(),
    )
    .await;

    assert_eq!(sink.headers()[0], "H1 Text");
    assert_eq!(sink.rows.len(), 3);
    assert_eq!(sink.rows[0].get(6), Some("1"));
    assert_eq!(sink.rows[1].get(6), Some("1"));
    assert_eq!(sink.rows[2].get(0), Some("No H1"));
    assert_eq!(sink.rows[2].get(3), Some("1"));
    assert_eq!(sink.summary_value("Summary - Duplicate H1 Rows:"), Some("2"));
    assert_eq!(sink.summary_value("Summary - Pages Missing H1:"), Some("1"));
}

#[tokio::test]
async fn test_tracking_pixel_is_excluded() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<title>Gallery</title>
        <img src="/logo.png" alt="Company logo">
        <img src="/t.gif" width="1" height="1">"#,
    )
    .await;
    Mock::given(method("HEAD"))
        .and(path("/logo.png"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "image/png"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(vec![0u8; 2048]),
        )
        .mount(&server)
        .await;

    let (sink, _) = run(
        &server,
        ReportKind::Images,
        &CancellationToken::new(),
        &mut RecordingObserver::default(),
    )
    .await;

    assert_eq!(sink.rows.len(), 1);
    let row = &sink.rows[0];
    assert_eq!(row.get(2), Some(format!("{}/logo.png", server.uri()).as_str()));
    assert_eq!(row.get(3), Some("Company logo"));
    assert_eq!(row.get(8), Some("No"));
    assert_eq!(row.get(9), Some("0"));
    assert_eq!(sink.summary_value("Total Images:"), Some("1"));

    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.url.path() != "/t.gif"));
}

#[tokio::test]
async fn test_missing_image_is_not_measured() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<title>Gallery</title><img src="/missing.png" alt="A logo">"#,
    )
    .await;
    Mock::given(method("HEAD"))
        .and(path("/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing.png"))
        .respond_with(
            ResponseTemplate::new(404)
                .insert_header("content-type", "text/html")
                .set_body_string("x".repeat(300 * 1024)),
        )
        .mount(&server)
        .await;

    let (sink, _) = run(
        &server,
        ReportKind::Images,
        &CancellationToken::new(),
        &mut RecordingObserver::default(),
    )
    .await;

    assert_eq!(sink.rows.len(), 1);
    let row = &sink.rows[0];
    assert_eq!(row.get(2), Some(format!("{}/missing.png", server.uri()).as_str()));
    // The 404 page is never reported as the image's size
    assert_eq!(row.get(7), Some(""));
    assert_eq!(row.get(8), Some("No"));
    assert_eq!(row.get(9), Some("0"));
    assert_eq!(sink.summary_value("Oversized Images:"), Some("0"));
}

#[tokio::test]
async fn test_transport_failure_is_counted_and_crawl_continues() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<title>Home page of the test site</title><a href="/slow">Slow</a><a href="/ok">OK</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("<title>Too late</title>").set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;
    mount_page(&server, "/ok", "<title>Fine</title>").await;

    let mut observer = RecordingObserver::default();
    let (sink, summary) = run(
        &server,
        ReportKind::Titles,
        &CancellationToken::new(),
        &mut observer,
    )
    .await;

    assert_eq!(summary.status, CrawlStatus::Completed);
    assert_eq!(summary.pages_visited, 3);
    assert_eq!(summary.fetch_failures, 1);
    let urls: Vec<&str> = sink.rows.iter().filter_map(|r| r.get(1)).collect();
    assert_eq!(urls.len(), 2);
    assert!(urls.iter().all(|u| !u.ends_with("/slow")));
    assert_eq!(observer.completions, vec![CrawlStatus::Completed]);
}

struct PanickingObserver;

impl CrawlObserver for PanickingObserver {
    fn on_progress(&mut self, _sample: ProgressSample) {
        panic!("observer bug");
    }

    fn on_complete(&mut self, _status: CrawlStatus) {
        panic!("observer bug");
    }
}

#[tokio::test]
async fn test_panicking_observer_does_not_abort_crawl() {
    let server = MockServer::start().await;
    mount_four_page_site(&server).await;

    let (sink, summary) = run(
        &server,
        ReportKind::Errors,
        &CancellationToken::new(),
        &mut PanickingObserver,
    )
    .await;

    assert_eq!(summary.status, CrawlStatus::Completed);
    assert_eq!(summary.pages_visited, 4);
    assert_eq!(sink.rows.len(), 4);
}

/// Sink that accepts the header and then fails every write
struct BrokenSink;

impl ReportSink for BrokenSink {
    fn begin(&mut self, _info: &ReportInfo) -> OutputResult<()> {
        Ok(())
    }

    fn write_rows(&mut self, _rows: &[Row]) -> OutputResult<()> {
        Err(OutputError::Write("disk full".to_string()))
    }

    fn write_summary(&mut self, _rows: &[Row]) -> OutputResult<()> {
        Err(OutputError::Write("disk full".to_string()))
    }

    fn finish(&mut self, _summary: &CrawlSummary) -> OutputResult<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_sink_failure_aborts_with_single_completion() {
    let server = MockServer::start().await;
    mount_four_page_site(&server).await;

    let crawler = Crawler::new(create_test_config()).unwrap();
    let mut visitor = ReportKind::Errors.create(&crawler.config().crawler);
    let mut observer = RecordingObserver::default();
    let result = crawler
        .crawl(
            &seed(&server),
            visitor.as_mut(),
            &mut BrokenSink,
            &CancellationToken::new(),
            &mut observer,
        )
        .await;

    assert!(matches!(result, Err(AuditError::Output(_))));
    assert_eq!(observer.completions, vec![CrawlStatus::Failed]);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_csv_and_sqlite_sinks() {
    let server = MockServer::start().await;
    mount_four_page_site(&server).await;

    let temp = TempDir::new().unwrap();
    let db_path = temp.path().join("reports.db");

    let mut sink = TeeSink::new()
        .with(CsvSink::new(temp.path(), ',').unwrap())
        .with(SqliteSink::open(&db_path).unwrap());
    let summary = run_report(
        create_test_config(),
        ReportKind::Errors,
        &seed(&server),
        &mut sink,
        &CancellationToken::new(),
        &mut RecordingObserver::default(),
    )
    .await
    .unwrap();
    assert_eq!(summary.rows_written, 4);
    drop(sink);

    let csv_path = std::fs::read_dir(temp.path())
        .unwrap()
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .find(|p| p.extension().is_some_and(|ext| ext == "csv"))
        .expect("CSV report not written");
    let file_name = csv_path.file_name().unwrap().to_string_lossy().to_string();
    assert!(file_name.starts_with("127.0.0.1_"));
    assert!(file_name.contains("-404-errors-"));

    let content = std::fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "Post Name,Post URL,Not Found,Posts with Issues");
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[5], ",,Total Pages with Issues:,1");

    let db = SqliteSink::open(&db_path).unwrap();
    let record = db.latest_report("404-errors").unwrap().unwrap();
    assert_eq!(record.status, "completed");
    assert_eq!(record.pages_visited, 4);
    assert_eq!(record.rows_written, 4);
    assert_eq!(db.load_rows(record.id, false).unwrap().len(), 4);
    assert_eq!(db.load_rows(record.id, true).unwrap().len(), 1);
}
