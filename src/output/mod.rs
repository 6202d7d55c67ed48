//! Report sinks
//!
//! A sink receives one report per crawl:
//! - `begin` with the report kind, seed and column headers
//! - `write_rows` for every batch of rows as pages are visited
//! - `write_summary` once, with the summary rows produced at the end
//! - `finish` with the crawl outcome
//!
//! Sinks write rows as they arrive so a cancelled crawl still leaves a usable
//! partial report behind.

mod csv_sink;
mod memory;
mod rows;
mod sqlite_sink;
mod tee;

pub use csv_sink::{report_file_name, CsvSink};
pub use memory::MemorySink;
pub(crate) use rows::row;
pub use rows::{yes_no, Row};
pub use sqlite_sink::{ReportRecord, SqliteSink};
pub use tee::TeeSink;

use crate::crawler::CrawlSummary;
use crate::visitor::ReportKind;
use chrono::{DateTime, Utc};
use thiserror::Error;
use url::Url;

/// Errors that can occur while writing a report
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write report: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Describes the report a sink is about to receive
#[derive(Debug, Clone)]
pub struct ReportInfo {
    pub kind: ReportKind,
    pub seed: Url,
    pub headers: Vec<String>,
    pub started_at: DateTime<Utc>,
}

impl ReportInfo {
    pub fn new(kind: ReportKind, seed: Url, headers: &[&str]) -> Self {
        Self {
            kind,
            seed,
            headers: headers.iter().map(|h| h.to_string()).collect(),
            started_at: Utc::now(),
        }
    }
}

/// Destination for report rows
pub trait ReportSink: Send {
    /// Opens the report; called once before any rows
    fn begin(&mut self, info: &ReportInfo) -> OutputResult<()>;

    /// Appends data rows
    fn write_rows(&mut self, rows: &[Row]) -> OutputResult<()>;

    /// Appends the summary block
    fn write_summary(&mut self, rows: &[Row]) -> OutputResult<()>;

    /// Closes the report; called once after the summary
    fn finish(&mut self, summary: &CrawlSummary) -> OutputResult<()>;
}

impl<S: ReportSink + ?Sized> ReportSink for Box<S> {
    fn begin(&mut self, info: &ReportInfo) -> OutputResult<()> {
        (**self).begin(info)
    }

    fn write_rows(&mut self, rows: &[Row]) -> OutputResult<()> {
        (**self).write_rows(rows)
    }

    fn write_summary(&mut self, rows: &[Row]) -> OutputResult<()> {
        (**self).write_summary(rows)
    }

    fn finish(&mut self, summary: &CrawlSummary) -> OutputResult<()> {
        (**self).finish(summary)
    }
}
