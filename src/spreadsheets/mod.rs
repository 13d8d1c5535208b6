//! Per-run snapshot files of the listings a crawl produced.

pub mod export_csv;
pub mod export_xlsx;

use crate::errors::StorageError;
use crate::scraper::ListingRecord;
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

pub use export_csv::write_listings_csv;
pub use export_xlsx::write_listings_xlsx;

pub const SNAPSHOT_HEADERS: [&str; 4] = ["title", "price_text", "price", "url"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotFormat {
    #[default]
    Csv,
    Xlsx,
}

impl SnapshotFormat {
    pub fn extension(self) -> &'static str {
        match self {
            SnapshotFormat::Csv => "csv",
            SnapshotFormat::Xlsx => "xlsx",
        }
    }
}

/// `kijiji_ottawa_20261018_142501.csv`
pub fn snapshot_filename(prefix: &str, format: SnapshotFormat, taken_at: NaiveDateTime) -> String {
    format!(
        "{}_{}.{}",
        prefix,
        taken_at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// Write one snapshot file into `dir` and return its path.
pub fn write_snapshot(
    records: &[ListingRecord],
    dir: impl AsRef<Path>,
    prefix: &str,
    format: SnapshotFormat,
    taken_at: NaiveDateTime,
) -> Result<PathBuf, StorageError> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)
        .map_err(|e| StorageError::Io(format!("Failed to create {}: {e}", dir.display())))?;

    let path = dir.join(snapshot_filename(prefix, format, taken_at));
    match format {
        SnapshotFormat::Csv => write_listings_csv(records, &path)?,
        SnapshotFormat::Xlsx => write_listings_xlsx(records, &path)?,
    }

    info!(path = %path.display(), rows = records.len(), "Wrote snapshot");
    Ok(path)
}
