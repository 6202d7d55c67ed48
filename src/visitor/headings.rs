//! H1 / H2 heading report
//!
//! Rows are buffered for the whole crawl: whether a heading is a duplicate is only
//! known once every page has been seen.

use crate::crawler::Markup;
use crate::output::{row, Row};
use crate::visitor::{
    reject_unsuccessful, Finalized, Page, PageOutcome, ReportKind, VisitContext, Visitor,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use url::Url;

const H1_HEADERS: &[&str] = &[
    "H1 Text",
    "Page URL",
    "Length",
    "Is Missing",
    "Is Multiple",
    "Is Long (>70)",
    "Is Duplicate",
    "Row Issue",
];

const H2_HEADERS: &[&str] = &[
    "H2 Text",
    "Page URL",
    "Length",
    "Is Missing",
    "Is Multiple",
    "Is Long (>70)",
    "Is Duplicate",
    "Row Issue",
];

/// Headings longer than this many characters are flagged
const MAX_HEADING_LENGTH: usize = 70;

/// Which heading level a [`HeadingVisitor`] reports on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    H1,
    H2,
}

impl HeadingLevel {
    fn tag(&self) -> &'static str {
        match self {
            HeadingLevel::H1 => "h1",
            HeadingLevel::H2 => "h2",
        }
    }

    fn name(&self) -> &'static str {
        match self {
            HeadingLevel::H1 => "H1",
            HeadingLevel::H2 => "H2",
        }
    }
}

#[derive(Debug, Clone)]
struct HeadingRow {
    text: String,
    page: Url,
    length: usize,
    missing: bool,
    multiple: bool,
    long: bool,
}

/// Reports missing, multiple, long and duplicate headings of one level
#[derive(Debug)]
pub struct HeadingVisitor {
    level: HeadingLevel,
    rows: Vec<HeadingRow>,
    /// Lowercased heading text -> pages it appears on
    pages_by_text: HashMap<String, HashSet<Url>>,
    pages: u64,
    missing: u64,
    multiple: u64,
    long: u64,
}

impl HeadingVisitor {
    pub fn new(level: HeadingLevel) -> Self {
        Self {
            level,
            rows: Vec::new(),
            pages_by_text: HashMap::new(),
            pages: 0,
            missing: 0,
            multiple: 0,
            long: 0,
        }
    }

    fn is_duplicate(&self, row: &HeadingRow) -> bool {
        !row.missing
            && self
                .pages_by_text
                .get(&row.text.to_lowercase())
                .is_some_and(|pages| pages.len() > 1)
    }
}

#[async_trait]
impl Visitor for HeadingVisitor {
    fn kind(&self) -> ReportKind {
        match self.level {
            HeadingLevel::H1 => ReportKind::H1,
            HeadingLevel::H2 => ReportKind::H2,
        }
    }

    fn headers(&self) -> &'static [&'static str] {
        match self.level {
            HeadingLevel::H1 => H1_HEADERS,
            HeadingLevel::H2 => H2_HEADERS,
        }
    }

    async fn on_page(&mut self, page: &Page, _ctx: &VisitContext<'_>) -> PageOutcome {
        if reject_unsuccessful(page) {
            return PageOutcome::stop();
        }

        let texts = Markup::parse(&page.body).texts(self.level.tag());
        self.pages += 1;

        if texts.is_empty() {
            self.missing += 1;
            self.rows.push(HeadingRow {
                text: format!("No {}", self.level.name()),
                page: page.url.clone(),
                length: 0,
                missing: true,
                multiple: false,
                long: false,
            });
            return PageOutcome::follow(Vec::new());
        }

        let multiple = texts.len() > 1;
        if multiple {
            self.multiple += 1;
        }

        for text in texts {
            let length = text.chars().count();
            let long = length > MAX_HEADING_LENGTH;
            if long {
                self.long += 1;
            }
            self.pages_by_text
                .entry(text.to_lowercase())
                .or_default()
                .insert(page.url.clone());
            self.rows.push(HeadingRow {
                text,
                page: page.url.clone(),
                length,
                missing: false,
                multiple,
                long,
            });
        }

        PageOutcome::follow(Vec::new())
    }

    fn finalize(&mut self) -> Finalized {
        let mut duplicates: u64 = 0;
        let rows = self
            .rows
            .iter()
            .map(|heading| {
                let duplicate = self.is_duplicate(heading);
                duplicates += u64::from(duplicate);
                let issue = heading.missing || heading.multiple || heading.long || duplicate;
                row![
                    heading.text,
                    heading.page,
                    heading.length,
                    u8::from(heading.missing),
                    u8::from(heading.multiple),
                    u8::from(heading.long),
                    u8::from(duplicate),
                    u8::from(issue)
                ]
            })
            .collect();

        let width = H1_HEADERS.len();
        let name = self.level.name();
        Finalized {
            rows,
            summary: vec![
                Row::summary(width, 2, "Summary - Total Pages Crawled:", self.pages),
                Row::summary(
                    width,
                    2,
                    &format!("Summary - Pages Missing {}:", name),
                    self.missing,
                ),
                Row::summary(
                    width,
                    2,
                    &format!("Summary - Pages with Multiple {}:", name),
                    self.multiple,
                ),
                Row::summary(width, 2, &format!("Summary - {} > 70:", name), self.long),
                Row::summary(
                    width,
                    2,
                    &format!("Summary - Duplicate {} Rows:", name),
                    duplicates,
                ),
            ],
        }
    }
}
