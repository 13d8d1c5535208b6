// errors.rs
use thiserror::Error;

/// Errors from the persistence side: the SQLite store and snapshot files.
/// None of these abort a crawl; callers log them and carry on.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database Error: {0}")]
    Db(String),
    #[error("CSV Error: {0}")]
    Csv(String),
    #[error("XLSX Error: {0}")]
    Xlsx(String),
    #[error("IO Error: {0}")]
    Io(String),
}
