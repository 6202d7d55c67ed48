//! Page title report

use crate::crawler::Markup;
use crate::output::{row, Row};
use crate::visitor::{
    reject_unsuccessful, Finalized, Page, PageOutcome, ReportKind, VisitContext, Visitor,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use url::Url;

const HEADERS: &[&str] = &[
    "Page Title",
    "Page URL",
    "Title Length",
    "Is Missing",
    "Is Short",
    "Is Long",
    "Is Duplicate",
    "Row Issue",
];

const MIN_TITLE_LENGTH: usize = 30;
const MAX_TITLE_LENGTH: usize = 60;

#[derive(Debug, Clone)]
struct TitleRow {
    title: Option<String>,
    page: Url,
    length: usize,
    short: bool,
    long: bool,
}

/// Reports missing, short, long and duplicate page titles
///
/// Rows are held until the crawl ends so duplicates can be flagged on every page that
/// shares a title.
#[derive(Debug, Default)]
pub struct TitleVisitor {
    rows: Vec<TitleRow>,
    pages_by_title: HashMap<String, HashSet<Url>>,
    missing: u64,
    short: u64,
    long: u64,
}

impl TitleVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_duplicate(&self, row: &TitleRow) -> bool {
        row.title
            .as_ref()
            .and_then(|t| self.pages_by_title.get(&t.to_lowercase()))
            .is_some_and(|pages| pages.len() > 1)
    }
}

#[async_trait]
impl Visitor for TitleVisitor {
    fn kind(&self) -> ReportKind {
        ReportKind::Titles
    }

    fn headers(&self) -> &'static [&'static str] {
        HEADERS
    }

    async fn on_page(&mut self, page: &Page, _ctx: &VisitContext<'_>) -> PageOutcome {
        if reject_unsuccessful(page) {
            return PageOutcome::stop();
        }

        let title = Markup::parse(&page.body).title();
        let length = title.as_deref().map_or(0, |t| t.chars().count());
        let short = title.is_some() && length < MIN_TITLE_LENGTH;
        let long = title.is_some() && length > MAX_TITLE_LENGTH;

        match &title {
            Some(t) => {
                self.pages_by_title
                    .entry(t.to_lowercase())
                    .or_default()
                    .insert(page.url.clone());
            }
            None => self.missing += 1,
        }
        self.short += u64::from(short);
        self.long += u64::from(long);

        self.rows.push(TitleRow {
            title,
            page: page.url.clone(),
            length,
            short,
            long,
        });

        PageOutcome::follow(Vec::new())
    }

    fn finalize(&mut self) -> Finalized {
        let mut duplicates: u64 = 0;
        let rows = self
            .rows
            .iter()
            .map(|entry| {
                let missing = entry.title.is_none();
                let duplicate = self.is_duplicate(entry);
                duplicates += u64::from(duplicate);
                let issue = missing || entry.short || entry.long || duplicate;
                row![
                    entry.title.as_deref().unwrap_or("No title"),
                    entry.page,
                    entry.length,
                    u8::from(missing),
                    u8::from(entry.short),
                    u8::from(entry.long),
                    u8::from(duplicate),
                    u8::from(issue)
                ]
            })
            .collect();

        let width = HEADERS.len();
        Finalized {
            rows,
            summary: vec![
                Row::summary(width, 2, "Summary - Total Pages Crawled:", self.rows.len()),
                Row::summary(width, 2, "Summary - Missing Titles:", self.missing),
                Row::summary(width, 2, "Summary - Short Titles (<30):", self.short),
                Row::summary(width, 2, "Summary - Long Titles (>60):", self.long),
                Row::summary(width, 2, "Summary - Duplicate Title Pages:", duplicates),
            ],
        }
    }
}
