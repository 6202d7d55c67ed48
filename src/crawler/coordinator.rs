//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the traversal loop that ties the pieces of a crawl together:
//! - Seeding and updating the frontier tracker
//! - Fetching pages and handing them to the visitor
//! - Following same-site links depth-first
//! - Polling the cancellation token
//! - Streaming rows to the report sink and emitting progress

use crate::config::Config;
use crate::crawler::observer::{notify_complete, notify_progress, CrawlObserver};
use crate::crawler::parser::extract_same_site_links;
use crate::crawler::{CancellationToken, Fetcher};
use crate::output::{OutputResult, ReportInfo, ReportSink, Row};
use crate::state::CrawlState;
use crate::visitor::{Page, Traversal, VisitContext, Visitor};
use crate::AuditError;
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::{Duration, Instant};
use url::Url;

/// How a crawl ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CrawlStatus {
    /// Every reachable page was visited
    #[default]
    Completed,

    /// The cancellation token stopped the traversal early
    Cancelled,

    /// A report sink failed and the crawl was aborted
    Failed,
}

impl CrawlStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrawlStatus::Completed => "completed",
            CrawlStatus::Cancelled => "cancelled",
            CrawlStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlSummary {
    pub status: CrawlStatus,

    /// Pages whose processing finished, including failed fetches
    pub pages_visited: u64,

    /// Distinct same-site URLs discovered
    pub pages_discovered: u64,

    /// Pages that could not be fetched at all
    pub fetch_failures: u64,

    /// Data rows streamed to the sink, excluding the summary block
    pub rows_written: u64,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed: Duration,
}

/// A unit of pending work on the traversal stack
enum Frame {
    /// Fetch and process this URL
    Visit(Url),

    /// Remaining links of a page that is being descended into
    Links(std::vec::IntoIter<Url>),
}

/// Counters gathered while traversing
#[derive(Debug, Default)]
struct Tally {
    fetch_failures: u64,
    rows_written: u64,
    cancelled: bool,
}

/// Runs crawls against one site at a time
///
/// A `Crawler` holds the HTTP fetcher and settings; all per-crawl state lives inside
/// [`crawl`](Self::crawl), so the same crawler can be reused for several reports.
pub struct Crawler {
    fetcher: Fetcher,
    config: Config,
}

impl Crawler {
    /// Creates a crawler, building the HTTP client from the configuration
    pub fn new(config: Config) -> Result<Self, AuditError> {
        let fetcher = Fetcher::new(&config.crawler, &config.user_agent)?;
        Ok(Self { fetcher, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Crawls every same-site page reachable from `seed`
    ///
    /// Pages are visited depth-first in document link order, each at most once. Rows are
    /// streamed to `sink` as pages are processed; the visitor's buffered rows and summary
    /// follow once traversal ends. `observer` receives a progress sample after every
    /// state change and exactly one completion signal, even when the sink fails.
    ///
    /// Fetch failures of individual pages never abort the crawl. A sink failure does,
    /// and is returned as [`AuditError::Output`].
    pub async fn crawl(
        &self,
        seed: &Url,
        visitor: &mut dyn Visitor,
        sink: &mut dyn ReportSink,
        cancel: &CancellationToken,
        observer: &mut dyn CrawlObserver,
    ) -> Result<CrawlSummary, AuditError> {
        let mut seed = seed.clone();
        seed.set_fragment(None);

        tracing::info!("Starting {} crawl of {}", visitor.kind().label(), seed);

        let result = self.run(&seed, visitor, sink, cancel, observer).await;
        let status = match &result {
            Ok(summary) => summary.status,
            Err(e) => {
                tracing::error!("Crawl of {} aborted: {}", seed, e);
                CrawlStatus::Failed
            }
        };

        notify_complete(observer, status);

        let summary = result?;
        tracing::info!(
            "Crawl {}: {} pages visited, {} discovered, {} fetch failures in {:?}",
            summary.status,
            summary.pages_visited,
            summary.pages_discovered,
            summary.fetch_failures,
            summary.elapsed
        );
        Ok(summary)
    }

    async fn run(
        &self,
        seed: &Url,
        visitor: &mut dyn Visitor,
        sink: &mut dyn ReportSink,
        cancel: &CancellationToken,
        observer: &mut dyn CrawlObserver,
    ) -> OutputResult<CrawlSummary> {
        let clock = Instant::now();
        let info = ReportInfo::new(visitor.kind(), seed.clone(), visitor.headers());
        let started_at = info.started_at;

        let mut state = CrawlState::seeded(seed);
        notify_progress(observer, state.progress());

        sink.begin(&info)?;

        let ctx = VisitContext {
            fetcher: &self.fetcher,
            seed,
            settings: &self.config.crawler,
        };
        let tally = self
            .traverse(&ctx, &mut state, visitor, sink, cancel, observer)
            .await?;

        let finalized = visitor.finalize();
        let rows_written = tally.rows_written + finalized.rows.len() as u64;
        write_batch(sink, &finalized.rows)?;
        sink.write_summary(&finalized.summary)?;

        let summary = CrawlSummary {
            status: if tally.cancelled {
                CrawlStatus::Cancelled
            } else {
                CrawlStatus::Completed
            },
            pages_visited: state.visited_count(),
            pages_discovered: state.discovered_count(),
            fetch_failures: tally.fetch_failures,
            rows_written,
            started_at,
            finished_at: Utc::now(),
            elapsed: clock.elapsed(),
        };
        sink.finish(&summary)?;

        Ok(summary)
    }

    /// Depth-first traversal on an explicit stack
    ///
    /// Descending into a link pushes the page's remaining links back first, so the
    /// visiting order matches a recursive descent.
    async fn traverse(
        &self,
        ctx: &VisitContext<'_>,
        state: &mut CrawlState,
        visitor: &mut dyn Visitor,
        sink: &mut dyn ReportSink,
        cancel: &CancellationToken,
        observer: &mut dyn CrawlObserver,
    ) -> OutputResult<Tally> {
        let mut tally = Tally::default();
        let mut stack = vec![Frame::Visit(ctx.seed.clone())];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Visit(url) => {
                    if cancel.is_cancelled() {
                        tally.cancelled = true;
                        // Pages whose links were being followed are finished as-is
                        unwind(&mut stack, state, observer);
                        break;
                    }

                    if !state.try_visit(&url) {
                        continue;
                    }

                    match self.visit(ctx, &url, visitor, sink, &mut tally).await? {
                        Some(links) => stack.push(Frame::Links(links.into_iter())),
                        None => {
                            state.complete_visit();
                            notify_progress(observer, state.progress());
                        }
                    }
                }
                Frame::Links(mut links) => {
                    if cancel.is_cancelled() {
                        tally.cancelled = true;
                        state.complete_visit();
                        notify_progress(observer, state.progress());
                        unwind(&mut stack, state, observer);
                        break;
                    }

                    match next_unvisited(&mut links, state) {
                        Some(link) => {
                            if state.mark_discovered(&link) {
                                notify_progress(observer, state.progress());
                            }
                            stack.push(Frame::Links(links));
                            stack.push(Frame::Visit(link));
                        }
                        None => {
                            state.complete_visit();
                            notify_progress(observer, state.progress());
                        }
                    }
                }
            }
        }

        Ok(tally)
    }

    /// Fetches one page and hands it to the visitor
    ///
    /// Returns the links to descend into, or None when the page is finished.
    async fn visit(
        &self,
        ctx: &VisitContext<'_>,
        url: &Url,
        visitor: &mut dyn Visitor,
        sink: &mut dyn ReportSink,
        tally: &mut Tally,
    ) -> OutputResult<Option<Vec<Url>>> {
        tracing::info!("Visiting {}", url);

        let response = match self.fetcher.get(url).await {
            Ok(response) => response,
            Err(e) => {
                tally.fetch_failures += 1;
                visitor.on_error(url, &e);
                return Ok(None);
            }
        };

        let links = extract_same_site_links(&response.body, &response.final_url, ctx.seed);
        let page = Page {
            url: url.clone(),
            final_url: response.final_url,
            status: response.status,
            headers: response.headers,
            body: response.body,
            links,
        };

        let outcome = visitor.on_page(&page, ctx).await;
        tally.rows_written += outcome.rows.len() as u64;
        write_batch(sink, &outcome.rows)?;

        match outcome.traversal {
            Traversal::Follow => Ok(Some(page.links)),
            Traversal::Stop => Ok(None),
        }
    }
}

/// Finishes every page still holding unfollowed links after a cancellation
fn unwind(stack: &mut Vec<Frame>, state: &mut CrawlState, observer: &mut dyn CrawlObserver) {
    while let Some(frame) = stack.pop() {
        if let Frame::Links(_) = frame {
            state.complete_visit();
            notify_progress(observer, state.progress());
        }
    }
}

/// Advances past links that were already visited
fn next_unvisited(links: &mut std::vec::IntoIter<Url>, state: &CrawlState) -> Option<Url> {
    links.find(|link| !state.is_visited(link))
}

fn write_batch(sink: &mut dyn ReportSink, rows: &[Row]) -> OutputResult<()> {
    if rows.is_empty() {
        return Ok(());
    }
    sink.write_rows(rows)
}
