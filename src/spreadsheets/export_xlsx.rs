use crate::errors::StorageError;
use crate::scraper::ListingRecord;
use crate::spreadsheets::SNAPSHOT_HEADERS;
use rust_xlsxwriter::Workbook;
use std::path::Path;

pub fn write_listings_xlsx(records: &[ListingRecord], path: &Path) -> Result<(), StorageError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    // Headers
    for (col, header) in SNAPSHOT_HEADERS.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, *header)
            .map_err(|e| {
                StorageError::Xlsx(format!("Failed to write header '{}': {}", header, e))
            })?;
    }

    // Rows
    for (i, record) in records.iter().enumerate() {
        let r = (i + 1) as u32;

        worksheet
            .write_string(r, 0, &record.title)
            .map_err(|e| StorageError::Xlsx(format!("Failed to write title: {}", e)))?;

        worksheet
            .write_string(r, 1, &record.price_text)
            .map_err(|e| StorageError::Xlsx(format!("Failed to write price text: {}", e)))?;

        // Leave the cell blank rather than writing a misleading zero.
        if let Some(price) = record.price {
            worksheet
                .write_number(r, 2, price)
                .map_err(|e| StorageError::Xlsx(format!("Failed to write price: {}", e)))?;
        }

        worksheet
            .write_string(r, 3, &record.url)
            .map_err(|e| StorageError::Xlsx(format!("Failed to write url: {}", e)))?;
    }

    workbook
        .save(path)
        .map_err(|e| StorageError::Xlsx(format!("Failed to save workbook: {}", e)))
}
