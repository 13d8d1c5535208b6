use crate::db::connection::Database;
use crate::errors::StorageError;
use crate::scraper::ListingRecord;
use chrono::Utc;
use rusqlite::params;
use tracing::{debug, info};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SaveSummary {
    pub inserted: usize,
    /// Rows skipped because their URL was already stored.
    pub ignored: usize,
}

/// Store listings keyed on URL. Existing rows are left untouched: a repeat
/// sighting never overwrites the title or price recorded the first time.
pub fn save_listings(db: &Database, records: &[ListingRecord]) -> Result<SaveSummary, StorageError> {
    let now = Utc::now().naive_utc();

    let summary = db.with_conn(|conn| {
        let tx = conn
            .transaction()
            .map_err(|e| StorageError::Db(e.to_string()))?;

        let mut summary = SaveSummary::default();
        {
            let mut stmt = tx
                .prepare(
                    r#"
                    INSERT OR IGNORE INTO listings (url, title, price_text, price, first_seen_at)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    "#,
                )
                .map_err(|e| StorageError::Db(e.to_string()))?;

            for record in records {
                if record.url.is_empty() {
                    debug!(title = %record.title, "Skipping listing without URL");
                    summary.ignored += 1;
                    continue;
                }

                let changed = stmt
                    .execute(params![
                        record.url,
                        record.title,
                        record.price_text,
                        record.price,
                        now
                    ])
                    .map_err(|e| StorageError::Db(e.to_string()))?;

                if changed == 0 {
                    summary.ignored += 1;
                } else {
                    summary.inserted += changed;
                }
            }
        }

        tx.commit().map_err(|e| StorageError::Db(e.to_string()))?;
        Ok(summary)
    })?;

    info!(
        inserted = summary.inserted,
        ignored = summary.ignored,
        "Saved listings"
    );
    Ok(summary)
}

/// Every stored listing, oldest first.
#[cfg(test)]
pub fn get_listings(db: &Database) -> Result<Vec<ListingRecord>, StorageError> {
    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare(
                r#"
                SELECT
                    title,        -- 0
                    price_text,   -- 1
                    price,        -- 2
                    url           -- 3
                FROM listings
                ORDER BY first_seen_at, rowid
                "#,
            )
            .map_err(|e| StorageError::Db(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(ListingRecord {
                    title: row.get(0)?,
                    price_text: row.get(1)?,
                    price: row.get(2)?,
                    url: row.get(3)?,
                })
            })
            .map_err(|e| StorageError::Db(e.to_string()))?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r.map_err(|e| StorageError::Db(e.to_string()))?);
        }
        Ok(out)
    })
}

pub fn count_listings(db: &Database) -> Result<i64, StorageError> {
    db.with_conn(|conn| {
        conn.query_row("SELECT count(*) FROM listings", [], |r| r.get(0))
            .map_err(|e| StorageError::Db(format!("count listings failed: {e}")))
    })
}
