//! Append-only ledger of already-commented articles.
//!
//! The ledger is the single source of truth for the "did we already
//! comment here" question. Page state is never trusted for that answer:
//! the site may fold, paginate, or lazily render existing comments.
//! Membership reads tolerate duplicate rows, so a crash between `has`
//! and `record` can at worst cause one redundant row, never a missed one.

use crate::store::StoreError;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize)]
struct LedgerRow {
    title: String,
    commented_time: String,
}

pub struct CommentLedger {
    path: PathBuf,
}

impl CommentLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Whether a title has ever been recorded. Full scan; the record set
    /// stays in the hundreds.
    pub fn has(&self, title: &str) -> Result<bool, StoreError> {
        if !self.path.exists() {
            return Ok(false);
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        for row in reader.deserialize::<LedgerRow>() {
            if row?.title == title {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Append one entry. Callers check `has` first in the same logical
    /// step; duplicates written by older runs are tolerated on read.
    pub fn record(&self, title: &str, commented_time: &str) -> Result<(), StoreError> {
        let existed = self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(!existed)
            .from_writer(file);
        writer.serialize(LedgerRow {
            title: title.to_string(),
            commented_time: commented_time.to_string(),
        })?;
        writer.flush()?;
        Ok(())
    }

    /// All recorded titles, duplicates included (summary view input).
    pub fn entries(&self) -> Result<Vec<(String, String)>, StoreError> {
        if !self.path.exists() {
            return Ok(vec![]);
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut out = Vec::new();
        for row in reader.deserialize::<LedgerRow>() {
            let row = row?;
            out.push((row.title, row.commented_time));
        }
        Ok(out)
    }
}
