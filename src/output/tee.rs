//! Fan-out sink

use crate::crawler::CrawlSummary;
use crate::output::{OutputResult, ReportInfo, ReportSink, Row};

/// Forwards every call to each inner sink in order, stopping at the first error
#[derive(Default)]
pub struct TeeSink {
    sinks: Vec<Box<dyn ReportSink>>,
}

impl TeeSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl ReportSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn push(&mut self, sink: Box<dyn ReportSink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl ReportSink for TeeSink {
    fn begin(&mut self, info: &ReportInfo) -> OutputResult<()> {
        self.sinks.iter_mut().try_for_each(|sink| sink.begin(info))
    }

    fn write_rows(&mut self, rows: &[Row]) -> OutputResult<()> {
        self.sinks.iter_mut().try_for_each(|sink| sink.write_rows(rows))
    }

    fn write_summary(&mut self, rows: &[Row]) -> OutputResult<()> {
        self.sinks
            .iter_mut()
            .try_for_each(|sink| sink.write_summary(rows))
    }

    fn finish(&mut self, summary: &CrawlSummary) -> OutputResult<()> {
        self.sinks.iter_mut().try_for_each(|sink| sink.finish(summary))
    }
}
