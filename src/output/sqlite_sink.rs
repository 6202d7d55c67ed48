//! SQLite report sink
//!
//! Every report becomes one row in `reports`, with its column names, data rows and
//! summary rows stored alongside. Several reports (from several crawls) can share one
//! database file.

use crate::crawler::CrawlSummary;
use crate::output::{OutputError, OutputResult, ReportInfo, ReportSink, Row};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQL schema for the report database
pub const SCHEMA_SQL: &str = r#"
-- One record per report produced by a crawl
CREATE TABLE IF NOT EXISTS reports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    seed TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    status TEXT NOT NULL,
    config_hash TEXT,
    pages_visited INTEGER NOT NULL DEFAULT 0,
    pages_discovered INTEGER NOT NULL DEFAULT 0,
    fetch_failures INTEGER NOT NULL DEFAULT 0,
    rows_written INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_reports_kind ON reports(kind);

-- Column headers, in order
CREATE TABLE IF NOT EXISTS report_columns (
    report_id INTEGER NOT NULL REFERENCES reports(id),
    position INTEGER NOT NULL,
    name TEXT NOT NULL,
    PRIMARY KEY (report_id, position)
);

-- Data and summary rows, in write order
CREATE TABLE IF NOT EXISTS report_rows (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    report_id INTEGER NOT NULL REFERENCES reports(id),
    position INTEGER NOT NULL,
    is_summary INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_report_rows_report ON report_rows(report_id);

-- Cell values of each row
CREATE TABLE IF NOT EXISTS report_cells (
    row_id INTEGER NOT NULL REFERENCES report_rows(id),
    position INTEGER NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (row_id, position)
);
"#;

/// Status recorded while a report is still being written
const STATUS_RUNNING: &str = "running";

/// A stored report record
#[derive(Debug, Clone)]
pub struct ReportRecord {
    pub id: i64,
    pub kind: String,
    pub seed: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub status: String,
    pub config_hash: Option<String>,
    pub pages_visited: u64,
    pub pages_discovered: u64,
    pub fetch_failures: u64,
    pub rows_written: u64,
}

/// Report sink backed by a SQLite database
pub struct SqliteSink {
    conn: Connection,
    config_hash: Option<String>,
    report_id: Option<i64>,
    next_position: i64,
}

impl SqliteSink {
    /// Opens (or creates) the database at `path`
    pub fn open(path: &Path) -> OutputResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        Self::with_connection(conn)
    }

    /// Creates an in-memory database
    pub fn in_memory() -> OutputResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> OutputResult<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn,
            config_hash: None,
            report_id: None,
            next_position: 0,
        })
    }

    /// Records the hash of the configuration the crawl ran with
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    /// Id of the report being written, once `begin` ran
    pub fn report_id(&self) -> Option<i64> {
        self.report_id
    }

    fn current_report(&self) -> OutputResult<i64> {
        self.report_id
            .ok_or_else(|| OutputError::Write("SQLite report was not started".to_string()))
    }

    fn insert_rows(&mut self, rows: &[Row], is_summary: bool) -> OutputResult<()> {
        let report_id = self.current_report()?;
        let mut position = self.next_position;

        let tx = self.conn.transaction()?;
        {
            let mut insert_row = tx.prepare(
                "INSERT INTO report_rows (report_id, position, is_summary) VALUES (?1, ?2, ?3)",
            )?;
            let mut insert_cell = tx.prepare(
                "INSERT INTO report_cells (row_id, position, value) VALUES (?1, ?2, ?3)",
            )?;

            for row in rows {
                insert_row.execute(params![report_id, position, is_summary])?;
                let row_id = tx.last_insert_rowid();
                for (column, value) in row.fields().iter().enumerate() {
                    insert_cell.execute(params![row_id, column as i64, value])?;
                }
                position += 1;
            }
        }
        tx.commit()?;

        self.next_position = position;
        Ok(())
    }

    /// Loads a report record by id
    pub fn get_report(&self, report_id: i64) -> OutputResult<Option<ReportRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, kind, seed, started_at, finished_at, status, config_hash,
                        pages_visited, pages_discovered, fetch_failures, rows_written
                 FROM reports WHERE id = ?1",
                params![report_id],
                |row| {
                    Ok(ReportRecord {
                        id: row.get(0)?,
                        kind: row.get(1)?,
                        seed: row.get(2)?,
                        started_at: row.get(3)?,
                        finished_at: row.get(4)?,
                        status: row.get(5)?,
                        config_hash: row.get(6)?,
                        pages_visited: row.get::<_, i64>(7)? as u64,
                        pages_discovered: row.get::<_, i64>(8)? as u64,
                        fetch_failures: row.get::<_, i64>(9)? as u64,
                        rows_written: row.get::<_, i64>(10)? as u64,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    /// Loads the most recent report of the given kind slug
    pub fn latest_report(&self, kind: &str) -> OutputResult<Option<ReportRecord>> {
        let id: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM reports WHERE kind = ?1 ORDER BY id DESC LIMIT 1",
                params![kind],
                |row| row.get(0),
            )
            .optional()?;

        match id {
            Some(id) => self.get_report(id),
            None => Ok(None),
        }
    }

    /// Loads the column headers of a report
    pub fn load_headers(&self, report_id: i64) -> OutputResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM report_columns WHERE report_id = ?1 ORDER BY position",
        )?;
        let headers = stmt
            .query_map(params![report_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(headers)
    }

    /// Loads the data rows (or the summary rows) of a report in write order
    pub fn load_rows(&self, report_id: i64, summary: bool) -> OutputResult<Vec<Row>> {
        let mut stmt = self.conn.prepare(
            "SELECT r.id, c.value
             FROM report_rows r
             JOIN report_cells c ON c.row_id = r.id
             WHERE r.report_id = ?1 AND r.is_summary = ?2
             ORDER BY r.position, c.position",
        )?;
        let cells = stmt
            .query_map(params![report_id, summary], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut rows: Vec<(i64, Vec<String>)> = Vec::new();
        for (row_id, value) in cells {
            match rows.last_mut() {
                Some((id, fields)) if *id == row_id => fields.push(value),
                _ => rows.push((row_id, vec![value])),
            }
        }

        Ok(rows.into_iter().map(|(_, fields)| Row::new(fields)).collect())
    }
}

impl ReportSink for SqliteSink {
    fn begin(&mut self, info: &ReportInfo) -> OutputResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO reports (kind, seed, started_at, status, config_hash)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                info.kind.slug(),
                info.seed.as_str(),
                info.started_at.to_rfc3339(),
                STATUS_RUNNING,
                self.config_hash
            ],
        )?;
        let report_id = tx.last_insert_rowid();

        for (position, name) in info.headers.iter().enumerate() {
            tx.execute(
                "INSERT INTO report_columns (report_id, position, name) VALUES (?1, ?2, ?3)",
                params![report_id, position as i64, name],
            )?;
        }
        tx.commit()?;

        tracing::debug!("Created report {} for {}", report_id, info.seed);
        self.report_id = Some(report_id);
        self.next_position = 0;
        Ok(())
    }

    fn write_rows(&mut self, rows: &[Row]) -> OutputResult<()> {
        self.insert_rows(rows, false)
    }

    fn write_summary(&mut self, rows: &[Row]) -> OutputResult<()> {
        self.insert_rows(rows, true)
    }

    fn finish(&mut self, summary: &CrawlSummary) -> OutputResult<()> {
        let report_id = self.current_report()?;
        self.conn.execute(
            "UPDATE reports
             SET finished_at = ?1, status = ?2, pages_visited = ?3, pages_discovered = ?4,
                 fetch_failures = ?5, rows_written = ?6
             WHERE id = ?7",
            params![
                Utc::now().to_rfc3339(),
                summary.status.as_str(),
                summary.pages_visited as i64,
                summary.pages_discovered as i64,
                summary.fetch_failures as i64,
                summary.rows_written as i64,
                report_id
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::CrawlStatus;
    use crate::output::row;
    use crate::visitor::ReportKind;
    use url::Url;

    fn info() -> ReportInfo {
        ReportInfo::new(
            ReportKind::H1,
            Url::parse("https://example.com/").unwrap(),
            &["H1 Text", "Page URL"],
        )
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA_SQL).unwrap();
        assert!(conn.execute_batch(SCHEMA_SQL).is_ok());
    }

    #[test]
    fn test_write_before_begin_fails() {
        let mut sink = SqliteSink::in_memory().unwrap();
        assert!(sink.write_rows(&[row!["a", "b"]]).is_err());
    }

    #[test]
    fn test_report_round_trip() {
        let mut sink = SqliteSink::in_memory().unwrap().with_config_hash("abc123");
        sink.begin(&info()).unwrap();
        sink.write_rows(&[row!["Welcome", "https://example.com/"]])
            .unwrap();
        sink.write_rows(&[row!["", "https://example.com/b"]]).unwrap();
        sink.write_summary(&[Row::summary(2, 0, "Pages Crawled", 2)])
            .unwrap();

        let summary = CrawlSummary {
            status: CrawlStatus::Completed,
            pages_visited: 2,
            pages_discovered: 2,
            rows_written: 2,
            ..CrawlSummary::default()
        };
        sink.finish(&summary).unwrap();

        let id = sink.report_id().unwrap();
        let record = sink.latest_report("h1").unwrap().unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.status, "completed");
        assert_eq!(record.config_hash.as_deref(), Some("abc123"));
        assert_eq!(record.pages_visited, 2);
        assert!(record.finished_at.is_some());

        assert_eq!(sink.load_headers(id).unwrap(), vec!["H1 Text", "Page URL"]);

        let rows = sink.load_rows(id, false).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get(0), Some("Welcome"));
        assert_eq!(rows[1].get(0), Some(""));

        let summary_rows = sink.load_rows(id, true).unwrap();
        assert_eq!(summary_rows, vec![Row::summary(2, 0, "Pages Crawled", 2)]);
    }

    #[test]
    fn test_missing_report() {
        let sink = SqliteSink::in_memory().unwrap();
        assert!(sink.get_report(42).unwrap().is_none());
        assert!(sink.latest_report("titles").unwrap().is_none());
    }
}
