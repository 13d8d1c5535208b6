use crate::errors::StorageError;
use crate::scraper::ListingRecord;
use crate::spreadsheets::SNAPSHOT_HEADERS;
use std::path::Path;

/// Header row first, then one row per listing; a missing price is an empty cell.
pub fn write_listings_csv(records: &[ListingRecord], path: &Path) -> Result<(), StorageError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| StorageError::Csv(format!("Failed to open {}: {e}", path.display())))?;

    writer
        .write_record(SNAPSHOT_HEADERS)
        .map_err(|e| StorageError::Csv(format!("Failed to write header: {e}")))?;

    for record in records {
        writer
            .serialize(record)
            .map_err(|e| StorageError::Csv(format!("Failed to write {}: {e}", record.url)))?;
    }

    writer
        .flush()
        .map_err(|e| StorageError::Io(format!("Failed to flush {}: {e}", path.display())))
}
