//! Report visitors
//!
//! A visitor is plugged into the crawl engine and sees every fetched page. For each page
//! it returns the report rows it produced and whether the engine should follow the
//! page's links. Visitors that need the whole crawl before deciding (duplicate titles
//! and headings) buffer their rows and release them from [`Visitor::finalize`].

mod errors;
mod headings;
mod images;
mod meta;
mod security;
mod titles;

pub use errors::ErrorVisitor;
pub use headings::{HeadingLevel, HeadingVisitor};
pub use images::{is_tracking_pixel, ImageVisitor};
pub use meta::MetaVisitor;
pub use security::SecurityVisitor;
pub use titles::TitleVisitor;

use crate::config::CrawlerConfig;
use crate::crawler::{FetchError, Fetcher};
use crate::output::Row;
use async_trait::async_trait;
use clap::ValueEnum;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::fmt;
use url::Url;

/// A fetched page as seen by a visitor
#[derive(Debug, Clone)]
pub struct Page {
    /// URL the engine requested
    pub url: Url,

    /// URL after redirects
    pub final_url: Url,

    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,

    /// Same-site links found in the body, normalized, in document order
    pub links: Vec<Url>,
}

impl Page {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Crawl-wide collaborators available to a visitor
pub struct VisitContext<'a> {
    /// Shared HTTP fetcher, used for image probes
    pub fetcher: &'a Fetcher,

    /// Normalized seed URL
    pub seed: &'a Url,

    pub settings: &'a CrawlerConfig,
}

/// Whether the engine should descend into a page's links
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    Follow,
    Stop,
}

/// What a visitor produced for one page
#[derive(Debug, Clone)]
pub struct PageOutcome {
    pub rows: Vec<Row>,
    pub traversal: Traversal,
}

impl PageOutcome {
    pub fn follow(rows: Vec<Row>) -> Self {
        Self {
            rows,
            traversal: Traversal::Follow,
        }
    }

    /// No rows, no traversal
    pub fn stop() -> Self {
        Self {
            rows: Vec::new(),
            traversal: Traversal::Stop,
        }
    }
}

/// Rows released once traversal has ended
#[derive(Debug, Clone, Default)]
pub struct Finalized {
    /// Buffered data rows
    pub rows: Vec<Row>,

    /// Summary rows, written after every data row
    pub summary: Vec<Row>,
}

/// A report producer plugged into the crawl engine
#[async_trait]
pub trait Visitor: Send {
    fn kind(&self) -> ReportKind;

    /// Column headers; every row this visitor emits has this many fields
    fn headers(&self) -> &'static [&'static str];

    /// Processes one fetched page, whatever its HTTP status
    async fn on_page(&mut self, page: &Page, ctx: &VisitContext<'_>) -> PageOutcome;

    /// Called when a page could not be fetched at all
    fn on_error(&mut self, url: &Url, error: &FetchError) {
        tracing::warn!("Failed to fetch {}: {}", url, error);
    }

    /// Releases buffered rows and the summary block
    fn finalize(&mut self) -> Finalized;
}

/// Rejects pages with a non-success status the way a failed fetch is rejected
///
/// Returns true when the visitor should stop processing the page.
pub(crate) fn reject_unsuccessful(page: &Page) -> bool {
    if page.is_success() {
        return false;
    }
    tracing::warn!("Failed to fetch {}: HTTP {}", page.url, page.status);
    true
}

/// Available reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum ReportKind {
    /// Missing meta descriptions
    Meta,
    /// Pages answering 404
    Errors,
    /// Image alt text and size
    Images,
    /// H1 headings
    H1,
    /// H2 headings
    H2,
    /// Page titles
    Titles,
    /// Security headers and mixed content
    Security,
}

impl ReportKind {
    pub const ALL: [ReportKind; 7] = [
        ReportKind::Meta,
        ReportKind::Errors,
        ReportKind::Images,
        ReportKind::H1,
        ReportKind::H2,
        ReportKind::Titles,
        ReportKind::Security,
    ];

    /// Short name used in report file names and database records
    pub fn slug(&self) -> &'static str {
        match self {
            ReportKind::Meta => "meta-descriptions",
            ReportKind::Errors => "404-errors",
            ReportKind::Images => "images",
            ReportKind::H1 => "h1",
            ReportKind::H2 => "h2",
            ReportKind::Titles => "page-titles",
            ReportKind::Security => "security",
        }
    }

    /// Human-readable name
    pub fn label(&self) -> &'static str {
        match self {
            ReportKind::Meta => "meta description",
            ReportKind::Errors => "404 error",
            ReportKind::Images => "image",
            ReportKind::H1 => "H1 heading",
            ReportKind::H2 => "H2 heading",
            ReportKind::Titles => "page title",
            ReportKind::Security => "security",
        }
    }

    /// Builds a fresh visitor for this report
    pub fn create(&self, settings: &CrawlerConfig) -> Box<dyn Visitor> {
        match self {
            ReportKind::Meta => Box::new(MetaVisitor::new()),
            ReportKind::Errors => Box::new(ErrorVisitor::new()),
            ReportKind::Images => Box::new(ImageVisitor::new(settings)),
            ReportKind::H1 => Box::new(HeadingVisitor::new(HeadingLevel::H1)),
            ReportKind::H2 => Box::new(HeadingVisitor::new(HeadingLevel::H2)),
            ReportKind::Titles => Box::new(TitleVisitor::new()),
            ReportKind::Security => Box::new(SecurityVisitor::new()),
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Shared fixtures for visitor unit tests
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::config::Config;
    use std::sync::OnceLock;

    pub fn fetcher() -> &'static Fetcher {
        static FETCHER: OnceLock<Fetcher> = OnceLock::new();
        FETCHER.get_or_init(|| {
            let config = Config::default();
            Fetcher::new(&config.crawler, &config.user_agent).unwrap()
        })
    }

    pub fn settings() -> &'static CrawlerConfig {
        static SETTINGS: OnceLock<CrawlerConfig> = OnceLock::new();
        SETTINGS.get_or_init(CrawlerConfig::default)
    }

    pub fn seed() -> &'static Url {
        static SEED: OnceLock<Url> = OnceLock::new();
        SEED.get_or_init(|| Url::parse("https://example.com/").unwrap())
    }

    pub fn ctx() -> VisitContext<'static> {
        VisitContext {
            fetcher: fetcher(),
            seed: seed(),
            settings: settings(),
        }
    }

    pub fn page(url: &str, status: u16, body: &str) -> Page {
        let url = Url::parse(url).unwrap();
        Page {
            final_url: url.clone(),
            url,
            status: StatusCode::from_u16(status).unwrap(),
            headers: HeaderMap::new(),
            body: body.to_string(),
            links: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_builds_matching_visitor() {
        let settings = CrawlerConfig::default();
        for kind in ReportKind::ALL {
            let visitor = kind.create(&settings);
            assert_eq!(visitor.kind(), kind);
            assert!(!visitor.headers().is_empty());
        }
    }

    #[test]
    fn test_kind_parses_from_cli_strings() {
        assert_eq!(ReportKind::from_str("h1", true), Ok(ReportKind::H1));
        assert_eq!(ReportKind::from_str("security", true), Ok(ReportKind::Security));
        assert!(ReportKind::from_str("sitemap", true).is_err());
    }

    #[test]
    fn test_slugs_are_unique() {
        let mut slugs: Vec<&str> = ReportKind::ALL.iter().map(|k| k.slug()).collect();
        slugs.sort_unstable();
        slugs.dedup();
        assert_eq!(slugs.len(), ReportKind::ALL.len());
    }

    #[test]
    fn test_reject_unsuccessful() {
        assert!(reject_unsuccessful(&testing::page("https://example.com/", 500, "")));
        assert!(!reject_unsuccessful(&testing::page("https://example.com/", 200, "")));
    }
}
