//! In-memory report sink

use crate::crawler::{CrawlStatus, CrawlSummary};
use crate::output::{OutputResult, ReportInfo, ReportSink, Row};

/// Keeps every report line in memory
///
/// Used by library callers that post-process rows themselves, and by tests.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub info: Option<ReportInfo>,
    pub rows: Vec<Row>,
    pub summary: Vec<Row>,
    pub status: Option<CrawlStatus>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Column headers passed to `begin`
    pub fn headers(&self) -> &[String] {
        self.info.as_ref().map(|i| i.headers.as_slice()).unwrap_or(&[])
    }

    /// Data rows whose column `index` equals `value`
    pub fn rows_where(&self, index: usize, value: &str) -> Vec<&Row> {
        self.rows
            .iter()
            .filter(|row| row.get(index) == Some(value))
            .collect()
    }

    /// Value next to the summary label `label`, if present
    pub fn summary_value(&self, label: &str) -> Option<&str> {
        self.summary.iter().find_map(|row| {
            let position = row.fields().iter().position(|f| f == label)?;
            row.get(position + 1)
        })
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_some()
    }
}

impl ReportSink for MemorySink {
    fn begin(&mut self, info: &ReportInfo) -> OutputResult<()> {
        self.info = Some(info.clone());
        Ok(())
    }

    fn write_rows(&mut self, rows: &[Row]) -> OutputResult<()> {
        self.rows.extend_from_slice(rows);
        Ok(())
    }

    fn write_summary(&mut self, rows: &[Row]) -> OutputResult<()> {
        self.summary.extend_from_slice(rows);
        Ok(())
    }

    fn finish(&mut self, summary: &CrawlSummary) -> OutputResult<()> {
        self.status = Some(summary.status);
        Ok(())
    }
}
