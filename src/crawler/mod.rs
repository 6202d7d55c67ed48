//! Crawler module for web page fetching and traversal
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with timeouts and size-capped probes
//! - HTML parsing and same-site link extraction
//! - Depth-first traversal with cooperative cancellation
//! - Progress and completion observers

mod cancel;
mod coordinator;
mod fetcher;
mod observer;
mod parser;

pub use cancel::CancellationToken;
pub use coordinator::{CrawlStatus, CrawlSummary, Crawler};
pub use fetcher::{
    build_http_client, header_str, BodySize, FetchError, FetchedResponse, Fetcher, HeadResponse,
};
pub use observer::{ChannelObserver, CrawlEvent, CrawlObserver, NoopObserver};
pub use parser::{element_text, extract_same_site_links, Markup};

use crate::config::Config;
use crate::output::ReportSink;
use crate::visitor::ReportKind;
use crate::AuditError;
use url::Url;

/// Runs a complete report crawl
///
/// This is the main entry point for producing one report. It will:
/// 1. Build the HTTP client from `config`
/// 2. Create the visitor for `kind`
/// 3. Crawl every same-site page reachable from `seed`
/// 4. Stream the report into `sink`
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `kind` - Which report to produce
/// * `seed` - Starting URL; its host and port define the site
/// * `sink` - Destination for the report rows
/// * `cancel` - Token that stops the crawl early when set
/// * `observer` - Receives progress samples and the completion signal
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Crawl completed or was cancelled
/// * `Err(AuditError)` - The client could not be built or the sink failed
pub async fn run_report(
    config: Config,
    kind: ReportKind,
    seed: &Url,
    sink: &mut dyn ReportSink,
    cancel: &CancellationToken,
    observer: &mut dyn CrawlObserver,
) -> Result<CrawlSummary, AuditError> {
    let mut visitor = kind.create(&config.crawler);
    let crawler = Crawler::new(config)?;
    crawler
        .crawl(seed, visitor.as_mut(), sink, cancel, observer)
        .await
}
