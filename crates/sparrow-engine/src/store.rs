//! Flat tabular stores for harvested feed data.
//!
//! Three files with three write disciplines: the title snapshot is
//! rewritten whole each harvest, article details append per article, and
//! the summary is a derived view regenerated on demand, never read back
//! as a source of truth.

use crate::ledger::CommentLedger;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct TitleRow {
    title: String,
}

/// Snapshot of feed titles; overwrite semantics, each harvest replaces
/// the previous run's view.
pub struct TitleSnapshot {
    path: PathBuf,
}

impl TitleSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn write(&self, titles: &[String]) -> Result<(), StoreError> {
        let mut writer = csv::Writer::from_path(&self.path)?;
        for title in titles {
            writer.serialize(TitleRow {
                title: title.clone(),
            })?;
        }
        writer.flush()?;
        info!(count = titles.len(), path = %self.path.display(), "title snapshot written");
        Ok(())
    }

    pub fn read(&self) -> Result<Vec<String>, StoreError> {
        if !self.path.exists() {
            return Ok(vec![]);
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut out = Vec::new();
        for row in reader.deserialize::<TitleRow>() {
            out.push(row?.title);
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub author: String,
    pub title: String,
    pub content: String,
    pub ai_comment: String,
}

/// Append-only detail records for harvested articles.
pub struct ArticleStore {
    path: PathBuf,
}

impl ArticleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn append(&self, record: &ArticleRecord) -> Result<(), StoreError> {
        let existed = self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(!existed)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;
        info!(title = %record.title, path = %self.path.display(), "article detail appended");
        Ok(())
    }

    pub fn read(&self) -> Result<Vec<ArticleRecord>, StoreError> {
        if !self.path.exists() {
            return Ok(vec![]);
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut out = Vec::new();
        for row in reader.deserialize::<ArticleRecord>() {
            out.push(row?);
        }
        Ok(out)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SummaryRow {
    title: String,
    author: String,
    has_detailed_content: bool,
    has_been_commented: bool,
    commented_time: String,
}

/// Regenerate the summary view by joining the snapshot, the detail
/// records and the ledger on the article title. Snapshot order is kept;
/// detail-only titles follow.
pub fn write_summary(
    titles: &TitleSnapshot,
    articles: &ArticleStore,
    ledger: &CommentLedger,
    out_path: &Path,
) -> Result<usize, StoreError> {
    let snapshot = titles.read()?;
    let details = articles.read()?;
    let commented = ledger.entries()?;

    let mut order: Vec<String> = snapshot.clone();
    for d in &details {
        if !order.contains(&d.title) {
            order.push(d.title.clone());
        }
    }

    let mut writer = csv::Writer::from_path(out_path)?;
    let count = order.len();
    for title in order {
        let detail = details.iter().find(|d| d.title == title);
        let comment = commented.iter().find(|(t, _)| *t == title);
        writer.serialize(SummaryRow {
            title,
            author: detail.map(|d| d.author.clone()).unwrap_or_default(),
            has_detailed_content: detail.is_some(),
            has_been_commented: comment.is_some(),
            commented_time: comment.map(|(_, at)| at.clone()).unwrap_or_default(),
        })?;
    }
    writer.flush()?;
    info!(count, path = %out_path.display(), "summary regenerated");
    Ok(count)
}
