//! 404 report

use crate::crawler::Markup;
use crate::output::{row, Row};
use crate::visitor::{Finalized, Page, PageOutcome, ReportKind, Traversal, VisitContext, Visitor};
use async_trait::async_trait;
use reqwest::StatusCode;

const HEADERS: &[&str] = &["Post Name", "Post URL", "Not Found", "Posts with Issues"];

/// Lists every visited page, flagging those that answer 404
///
/// The article counter only advances on found pages, so a 404 row is labelled with the
/// number the next found page will take.
#[derive(Debug)]
pub struct ErrorVisitor {
    article: u64,
    issues: u64,
}

impl ErrorVisitor {
    pub fn new() -> Self {
        Self {
            article: 1,
            issues: 0,
        }
    }
}

impl Default for ErrorVisitor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Visitor for ErrorVisitor {
    fn kind(&self) -> ReportKind {
        ReportKind::Errors
    }

    fn headers(&self) -> &'static [&'static str] {
        HEADERS
    }

    async fn on_page(&mut self, page: &Page, _ctx: &VisitContext<'_>) -> PageOutcome {
        if page.status == StatusCode::NOT_FOUND {
            tracing::info!("404 Not Found: {}", page.url);
            let rows = vec![row![
                format!("Article {}", self.article),
                page.url,
                "404 Not Found",
                self.issues
            ]];
            self.issues += 1;
            return PageOutcome {
                rows,
                traversal: Traversal::Stop,
            };
        }

        if !page.is_success() {
            tracing::warn!("Failed to fetch {}: HTTP {}", page.url, page.status);
            return PageOutcome::stop();
        }

        let title = Markup::parse(&page.body)
            .title()
            .unwrap_or_else(|| "No title".to_string());
        let rows = vec![row![title, page.url, "Page Found", self.issues]];
        self.article += 1;

        PageOutcome::follow(rows)
    }

    fn finalize(&mut self) -> Finalized {
        Finalized {
            rows: Vec::new(),
            summary: vec![Row::summary(
                HEADERS.len(),
                2,
                "Total Pages with Issues:",
                self.issues,
            )],
        }
    }
}
