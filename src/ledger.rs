//! Append-only CSV ledger of per-site balances.
//!
//! One row per run: a timestamp column followed by one value per configured
//! site, in a fixed order. Failed sites keep their column with the `N/A`
//! sentinel so rows stay aligned for downstream charting.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::money::{format_dollars, Cents};

pub const UNAVAILABLE: &str = "N/A";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One site's cell in a ledger row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEntry {
    Balance(Cents),
    /// The site could not be scraped this run. The column is still emitted.
    Unavailable,
}

impl LedgerEntry {
    pub fn render(&self) -> String {
        match self {
            LedgerEntry::Balance(cents) => format_dollars(*cents),
            LedgerEntry::Unavailable => UNAVAILABLE.to_string(),
        }
    }
}

/// One timestamped scrape across every configured site, in column order.
#[derive(Debug, Clone)]
pub struct LedgerRow {
    pub timestamp: DateTime<Utc>,
    pub entries: Vec<(String, LedgerEntry)>,
}

/// Appender for the CSV ledger file.
#[derive(Debug, Clone)]
pub struct CsvLedger {
    path: PathBuf,
}

impl CsvLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row, writing the header (`Date` plus site ids) first when
    /// the file is new or empty. Existing rows are never touched.
    pub fn append(&self, row: &LedgerRow) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create ledger directory: {}", parent.display())
                })?;
            }
        }

        let needs_header = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open ledger: {}", self.path.display()))?;
        let mut writer = csv::Writer::from_writer(file);

        if needs_header {
            let mut header = vec!["Date".to_string()];
            header.extend(row.entries.iter().map(|(site_id, _)| site_id.clone()));
            writer.write_record(&header)?;
        }

        let mut record = vec![row.timestamp.format(TIMESTAMP_FORMAT).to_string()];
        record.extend(row.entries.iter().map(|(_, entry)| entry.render()));
        writer.write_record(&record)?;
        writer.flush()?;
        Ok(())
    }

    /// Date of the most recent row, if any. Backs the skip-if-run-today check.
    pub fn last_run_date(&self) -> Result<Option<NaiveDate>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("Failed to read ledger: {}", self.path.display()))?;

        let mut last = None;
        for record in reader.records() {
            let record = record?;
            if let Some(raw) = record.get(0) {
                if let Ok(timestamp) = NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT) {
                    last = Some(timestamp.date());
                }
            }
        }
        Ok(last)
    }
}
