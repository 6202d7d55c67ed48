//! Delimited-text report sink

use crate::crawler::CrawlSummary;
use crate::output::{OutputError, OutputResult, ReportInfo, ReportSink, Row};
use crate::url::site_label;
use chrono::{DateTime, Utc};
use csv::{Writer, WriterBuilder};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Writes each report to its own CSV file inside a directory
///
/// The file is created in `begin` and named after the site, the report kind and the
/// crawl start time. Rows are flushed as they arrive.
pub struct CsvSink {
    directory: PathBuf,
    delimiter: u8,
    path: Option<PathBuf>,
    writer: Option<Writer<File>>,
}

impl CsvSink {
    /// Creates a sink writing into `directory`
    ///
    /// Delimiters outside ASCII cannot be expressed as a single byte and are rejected.
    pub fn new(directory: impl AsRef<Path>, delimiter: char) -> OutputResult<Self> {
        if !delimiter.is_ascii() {
            return Err(OutputError::Write(format!(
                "Delimiter '{}' is not an ASCII character",
                delimiter
            )));
        }

        Ok(Self {
            directory: directory.as_ref().to_path_buf(),
            delimiter: delimiter as u8,
            path: None,
            writer: None,
        })
    }

    /// Path of the report file, once `begin` created it
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn writer(&mut self) -> OutputResult<&mut Writer<File>> {
        self.writer
            .as_mut()
            .ok_or_else(|| OutputError::Write("CSV report was not started".to_string()))
    }

    fn write_all(&mut self, rows: &[Row]) -> OutputResult<()> {
        let writer = self.writer()?;
        for row in rows {
            writer.write_record(row.fields())?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl ReportSink for CsvSink {
    fn begin(&mut self, info: &ReportInfo) -> OutputResult<()> {
        fs::create_dir_all(&self.directory)?;

        let path = self
            .directory
            .join(report_file_name(&info.seed, info.kind.slug(), info.started_at));
        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_path(&path)?;
        writer.write_record(&info.headers)?;
        writer.flush()?;

        tracing::info!("Writing {} report to {}", info.kind.label(), path.display());
        self.path = Some(path);
        self.writer = Some(writer);
        Ok(())
    }

    fn write_rows(&mut self, rows: &[Row]) -> OutputResult<()> {
        self.write_all(rows)
    }

    fn write_summary(&mut self, rows: &[Row]) -> OutputResult<()> {
        self.write_all(rows)
    }

    fn finish(&mut self, summary: &CrawlSummary) -> OutputResult<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        if let Some(path) = &self.path {
            tracing::info!(
                "Report {} closed ({}, {} rows)",
                path.display(),
                summary.status,
                summary.rows_written
            );
        }
        Ok(())
    }
}

/// Builds a report file name such as `example.com-h1-20240131-142501.csv`
pub fn report_file_name(seed: &url::Url, slug: &str, started_at: DateTime<Utc>) -> String {
    format!(
        "{}-{}-{}.csv",
        site_label(seed),
        slug,
        started_at.format("%Y%m%d-%H%M%S")
    )
}
