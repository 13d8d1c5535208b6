use crate::errors::StorageError;
use rusqlite::{params, Connection};

#[derive(Debug)]
pub struct CrawlRun {
    pub id: i64,
    pub base_url: String,
    pub started_at: i64,
    pub finished_at: Option<i64>,
    pub pages_fetched: Option<i64>,
    pub listings_seen: Option<i64>,
    pub listings_inserted: Option<i64>,
    pub success: bool,
    pub error_message: Option<String>,
}

/// How a run ended, written back by [`end_crawl_run`].
#[derive(Debug, Default)]
pub struct RunTotals {
    pub pages_fetched: usize,
    pub listings_seen: usize,
    pub listings_inserted: usize,
    pub error: Option<String>,
}

pub fn start_crawl_run(conn: &Connection, base_url: &str, now: i64) -> Result<i64, StorageError> {
    conn.execute(
        "INSERT INTO crawl_runs (base_url, started_at, success) VALUES (?, ?, 0)",
        params![base_url, now],
    )
    .map_err(|e| StorageError::Db(e.to_string()))?;
    Ok(conn.last_insert_rowid())
}

pub fn end_crawl_run(
    conn: &Connection,
    run_id: i64,
    now: i64,
    totals: &RunTotals,
) -> Result<(), StorageError> {
    conn.execute(
        "UPDATE crawl_runs SET finished_at = ?, pages_fetched = ?, listings_seen = ?, listings_inserted = ?, success = ?, error_message = ? WHERE id = ?",
        params![
            now,
            totals.pages_fetched as i64,
            totals.listings_seen as i64,
            totals.listings_inserted as i64,
            totals.error.is_none(),
            totals.error,
            run_id
        ],
    )
    .map_err(|e| StorageError::Db(e.to_string()))?;
    Ok(())
}

pub fn recent_crawl_runs(conn: &Connection) -> Result<Vec<CrawlRun>, StorageError> {
    let mut stmt = conn
        .prepare("SELECT id, base_url, started_at, finished_at, pages_fetched, listings_seen, listings_inserted, success, error_message FROM crawl_runs ORDER BY started_at DESC, id DESC LIMIT 50")
        .map_err(|e| StorageError::Db(e.to_string()))?;

    let rows = stmt
        .query_map([], |row| {
            Ok(CrawlRun {
                id: row.get(0)?,
                base_url: row.get(1)?,
                started_at: row.get(2)?,
                finished_at: row.get(3)?,
                pages_fetched: row.get(4)?,
                listings_seen: row.get(5)?,
                listings_inserted: row.get(6)?,
                success: row.get(7)?,
                error_message: row.get(8)?,
            })
        })
        .map_err(|e| StorageError::Db(e.to_string()))?;

    let mut runs = Vec::new();
    for r in rows {
        runs.push(r.map_err(|e| StorageError::Db(e.to_string()))?);
    }
    Ok(runs)
}
